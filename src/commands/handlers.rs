//! One handler per command word.

use std::time::Duration;

use super::args::{parse_color, parse_flag, parse_offset, parse_seconds, parse_tolerance, split_tolerance};
use super::{Command, CommandContext, CommandError};
use crate::color::{BlacklistEntry, Tolerance};
use crate::guild::{OptOutChange, Settings};

/// Run `command` with its arguments and return the reply.
pub async fn run(command: Command, ctx: &CommandContext<'_>, args: &[&str]) -> Result<String, CommandError> {
    match command {
        Command::Cooldown => cooldown(ctx, args),
        Command::GlobalCooldown => flag(ctx, args, "Global cooldown", |s| &mut s.global_cooldown),
        Command::CheckRole => flag(ctx, args, "Role check", |s| &mut s.check_role),
        Command::MoveRole => flag(ctx, args, "Role moving", |s| &mut s.move_role),
        Command::CheckOptOut => flag(ctx, args, "Opt-out check", |s| &mut s.check_opt_out),
        Command::Rave => flag(ctx, args, "Rave", |s| &mut s.enabled),
        Command::RoleName => role_name(ctx, args),
        Command::RoleOffset => role_offset(ctx, args),
        Command::Tolerance => tolerance(ctx, args),
        Command::Blacklist => blacklist(ctx, args).await,
        Command::OptOut => opt_out(ctx),
        Command::OptIn => opt_in(ctx),
        Command::Color => color(ctx, args).await,
        Command::Settings => Ok(format!("Current settings:\n{}", ctx.guild.settings())),
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn cooldown(ctx: &CommandContext<'_>, args: &[&str]) -> Result<String, CommandError> {
    let Some(word) = args.first() else {
        let settings = ctx.guild.settings();
        let scope = if settings.global_cooldown { "global" } else { "per user" };
        return Ok(format!(
            "The cooldown is {} seconds ({scope}).",
            settings.cooldown.as_secs()
        ));
    };
    ctx.ensure_admin()?;
    let seconds = parse_seconds(word)
        .ok_or_else(|| CommandError::invalid(format!("Cooldown must be a whole number of seconds, got \"{word}\".")))?;
    ctx.guild
        .update_settings(|s| s.cooldown = Duration::from_secs(seconds))?;
    Ok(format!("Cooldown set to {seconds} seconds."))
}

/// Query or set one of the on/off settings.
fn flag(
    ctx: &CommandContext<'_>,
    args: &[&str],
    label: &str,
    field: fn(&mut Settings) -> &mut bool,
) -> Result<String, CommandError> {
    let Some(word) = args.first() else {
        let mut settings = ctx.guild.settings();
        return Ok(format!("{label} is {}.", on_off(*field(&mut settings))));
    };
    ctx.ensure_admin()?;
    let value = parse_flag(word)
        .ok_or_else(|| CommandError::invalid(format!("Expected on or off, got \"{word}\".")))?;
    ctx.guild.update_settings(|s| *field(s) = value)?;
    Ok(format!("{label} turned {}.", on_off(value)))
}

fn role_name(ctx: &CommandContext<'_>, args: &[&str]) -> Result<String, CommandError> {
    if args.is_empty() {
        return Ok(format!("The rave role is \"{}\".", ctx.guild.settings().role_name));
    }
    ctx.ensure_admin()?;
    let name = args.join(" ");
    ctx.guild.update_settings(|s| s.role_name = name.clone())?;
    Ok(format!("The rave role is now \"{name}\"."))
}

fn role_offset(ctx: &CommandContext<'_>, args: &[&str]) -> Result<String, CommandError> {
    let Some(word) = args.first() else {
        return Ok(format!("The role offset is {}.", ctx.guild.settings().role_offset));
    };
    ctx.ensure_admin()?;
    let offset = parse_offset(word)
        .ok_or_else(|| CommandError::invalid(format!("Role offset must be a whole number, got \"{word}\".")))?;
    ctx.guild.update_settings(|s| s.role_offset = offset)?;
    Ok(format!("Role offset set to {offset}."))
}

fn tolerance_arg(word: &str) -> Result<Tolerance, CommandError> {
    parse_tolerance(word)
        .ok_or_else(|| CommandError::invalid(format!("Tolerance must be a number between 0 and 1, got \"{word}\".")))
}

fn tolerance(ctx: &CommandContext<'_>, args: &[&str]) -> Result<String, CommandError> {
    let Some(word) = args.first() else {
        return Ok(format!("The default tolerance is {}.", ctx.guild.settings().tolerance));
    };
    ctx.ensure_admin()?;
    let tolerance = tolerance_arg(word)?;
    ctx.guild.update_settings(|s| s.tolerance = tolerance)?;
    Ok(format!("Default tolerance set to {tolerance}."))
}

async fn blacklist(ctx: &CommandContext<'_>, args: &[&str]) -> Result<String, CommandError> {
    let Some((action, rest)) = args.split_first() else {
        return Ok(list_blacklist(&ctx.guild.settings()));
    };
    ctx.ensure_admin()?;

    match action.to_ascii_lowercase().as_str() {
        "add" => {
            let (head, tol) = split_tolerance(rest, |h| parse_color(h).is_some());
            let color = parse_color(head).ok_or_else(|| {
                CommandError::invalid(format!("Could not read a color from \"{}\".", head.join(" ")))
            })?;
            let tolerance = tol.map(tolerance_arg).transpose()?;
            add_entry(ctx, color, tolerance)
        }
        "role" => {
            let (head, tol) = split_tolerance(rest, |_| true);
            let (name, tolerance) = match tol.and_then(parse_tolerance) {
                Some(tolerance) => (head.join(" "), Some(tolerance)),
                None => (rest.join(" "), None),
            };
            if name.is_empty() {
                return Err(CommandError::invalid("Name the role whose color to blacklist."));
            }
            let role = ctx
                .transport
                .role_named(ctx.guild.id(), &name)
                .await?
                .ok_or_else(|| CommandError::invalid(format!("Role \"{name}\" not found.")))?;
            add_entry(ctx, role.color, tolerance)
        }
        "remove" => {
            let word = rest
                .first()
                .ok_or_else(|| CommandError::invalid("Give the number of the entry to remove."))?;
            let missing = || CommandError::invalid(format!("There is no blacklist entry {word}."));
            let len = ctx.guild.settings().blacklist.len();
            let index = word
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=len).contains(n))
                .ok_or_else(missing)?;
            let removed = ctx
                .guild
                .update_settings(|s| s.blacklist.remove(index - 1))?
                .ok_or_else(missing)?;
            Ok(format!("Removed {} from the blacklist.", removed.color))
        }
        "clear" => {
            ctx.guild.update_settings(|s| s.blacklist.clear())?;
            Ok("Blacklist cleared.".to_string())
        }
        other => Err(CommandError::invalid(format!(
            "Unknown blacklist action \"{other}\". Use add, role, remove or clear."
        ))),
    }
}

fn add_entry(
    ctx: &CommandContext<'_>,
    color: crate::color::Color,
    tolerance: Option<Tolerance>,
) -> Result<String, CommandError> {
    let entry = ctx.guild.update_settings(|s| {
        let entry = BlacklistEntry::new(color, tolerance.unwrap_or(s.tolerance));
        s.blacklist.push(entry);
        entry
    })?;
    Ok(format!(
        "Blacklisted {} with tolerance {}: {}.",
        entry.color,
        entry.tolerance,
        entry.exclusion_range()
    ))
}

fn list_blacklist(settings: &Settings) -> String {
    if settings.blacklist.is_empty() {
        return "The blacklist is empty.".to_string();
    }
    let mut reply = String::from("Blacklisted colors:");
    for (i, (entry, range)) in settings
        .blacklist
        .entries()
        .iter()
        .zip(settings.blacklist.ranges())
        .enumerate()
    {
        reply.push_str(&format!(
            "\n{}. {} tolerance {}: {range}",
            i + 1,
            entry.color,
            entry.tolerance
        ));
    }
    reply
}

const OPT_OUT_DISABLED: &str = "Opting out is disabled in this server.";

fn opt_out(ctx: &CommandContext<'_>) -> Result<String, CommandError> {
    Ok(match ctx.guild.opt_out(ctx.event.author.id)? {
        OptOutChange::Changed => "You are now opted out of the rave.",
        OptOutChange::Unchanged => "You were already opted out.",
        OptOutChange::Disabled => OPT_OUT_DISABLED,
    }
    .to_string())
}

fn opt_in(ctx: &CommandContext<'_>) -> Result<String, CommandError> {
    Ok(match ctx.guild.opt_in(ctx.event.author.id)? {
        OptOutChange::Changed => "Welcome back to the rave.",
        OptOutChange::Unchanged => "You were not opted out.",
        OptOutChange::Disabled => OPT_OUT_DISABLED,
    }
    .to_string())
}

async fn color(ctx: &CommandContext<'_>, args: &[&str]) -> Result<String, CommandError> {
    let member = if args.is_empty() {
        ctx.event.author.clone()
    } else {
        ctx.transport
            .find_member(ctx.guild.id(), &args.join(" "))
            .await?
    };
    Ok(match member.effective_color() {
        Some(color) => format!("{}'s color is {color}.", member.name),
        None => format!("{} has no color.", member.name),
    })
}
