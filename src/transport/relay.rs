//! HTTP relay transport.
//!
//! Forwards every outbound operation to a gateway relay that owns the real
//! chat connection. Endpoints, relative to the configured base URL:
//!
//! - `GET    /guilds/{guild}/roles`
//! - `PATCH  /guilds/{guild}/roles/{role}`            `{"color": u32}`
//! - `POST   /guilds/{guild}/roles`                   `{"name": str, "color": u32}`
//! - `PATCH  /guilds/{guild}/roles/{role}/position`   `{"position": i64}`
//! - `PUT    /guilds/{guild}/members/{user}/roles/{role}`
//! - `GET    /guilds/{guild}/members?name={name}`
//! - `POST   /channels/{channel}/messages`            `{"content": str}`

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{Transport, TransportError};
use crate::color::Color;
use crate::types::{ChannelId, GuildId, Member, Role, RoleId, UserId};

#[derive(Debug, Clone)]
/// [`Transport`] that forwards every call to the gateway relay over HTTP.
pub struct RelayTransport {
    client: Client,
    base_url: String,
}

impl RelayTransport {
    /// Create a relay transport with a default client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a relay transport on an existing client. A trailing `/` on
    /// `base_url` is dropped.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Base URL every endpoint path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        check_status(response.status(), what)?;
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, TransportError> {
        self.send(request, what)
            .await?
            .json::<T>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

fn check_status(status: StatusCode, what: &str) -> Result<(), TransportError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::NOT_FOUND => Err(TransportError::NotFound(what.to_string())),
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
            Err(TransportError::PermissionDenied(what.to_string()))
        }
        StatusCode::CONFLICT => Err(TransportError::Conflict(what.to_string())),
        other => Err(TransportError::Unavailable(format!("{what}: HTTP {other}"))),
    }
}

#[async_trait]
impl Transport for RelayTransport {
    async fn roles(&self, guild: GuildId) -> Result<Vec<Role>, TransportError> {
        let request = self.client.get(self.url(&format!("/guilds/{guild}/roles")));
        self.send_json(request, &format!("guild {guild}")).await
    }

    async fn edit_role_color(
        &self,
        guild: GuildId,
        role: RoleId,
        color: Color,
    ) -> Result<(), TransportError> {
        let request = self
            .client
            .patch(self.url(&format!("/guilds/{guild}/roles/{role}")))
            .json(&json!({ "color": color }));
        self.send(request, &format!("role {role}")).await.map(drop)
    }

    async fn create_role(&self, guild: GuildId, name: &str, color: Color) -> Result<Role, TransportError> {
        let request = self
            .client
            .post(self.url(&format!("/guilds/{guild}/roles")))
            .json(&json!({ "name": name, "color": color }));
        self.send_json(request, &format!("guild {guild}")).await
    }

    async fn move_role(&self, guild: GuildId, role: RoleId, position: i64) -> Result<(), TransportError> {
        let request = self
            .client
            .patch(self.url(&format!("/guilds/{guild}/roles/{role}/position")))
            .json(&json!({ "position": position }));
        self.send(request, &format!("role {role}")).await.map(drop)
    }

    async fn add_member_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<(), TransportError> {
        let request = self
            .client
            .put(self.url(&format!("/guilds/{guild}/members/{user}/roles/{role}")));
        self.send(request, &format!("member {user} or role {role}"))
            .await
            .map(drop)
    }

    async fn find_member(&self, guild: GuildId, name: &str) -> Result<Member, TransportError> {
        let request = self
            .client
            .get(self.url(&format!("/guilds/{guild}/members")))
            .query(&[("name", name)]);
        self.send_json(request, &format!("member {name}")).await
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<(), TransportError> {
        let request = self
            .client
            .post(self.url(&format!("/channels/{channel}/messages")))
            .json(&json!({ "content": content }));
        self.send(request, &format!("channel {channel}")).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let relay = RelayTransport::new("http://relay.local/api/");
        assert_eq!(relay.base_url(), "http://relay.local/api");
        assert_eq!(relay.url("/guilds/1/roles"), "http://relay.local/api/guilds/1/roles");
    }

    #[test]
    fn test_status_mapping() {
        assert!(check_status(StatusCode::NO_CONTENT, "x").is_ok());
        assert_eq!(
            check_status(StatusCode::NOT_FOUND, "role 4"),
            Err(TransportError::NotFound("role 4".to_string()))
        );
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN, "role 4"),
            Err(TransportError::PermissionDenied(_))
        ));
        assert!(matches!(
            check_status(StatusCode::CONFLICT, "role 4"),
            Err(TransportError::Conflict(_))
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY, "role 4"),
            Err(TransportError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_unavailable() {
        let relay = RelayTransport::new("http://127.0.0.1:1");
        let result = relay.roles(GuildId(1)).await;
        assert!(matches!(result, Err(TransportError::Unavailable(_))));
    }
}
