// LIFX light commands. Input validation lives in the core light service; this
// file only picks the service, calls it and formats the result.
//
// The token drives real lights in the owner's home, so every subcommand is
// restricted to bot owners.

use crate::core::chat::formatting::truncate;
use crate::core::lights::{LightError, LightResult, Power};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

const NOT_CONFIGURED: &str = "⚠️ Light control isn't set up on this bot.";

/// Shared reply for every state-changing subcommand.
async fn report(
    ctx: Context<'_>,
    action: &str,
    result: Result<Vec<LightResult>, LightError>,
) -> Result<(), Error> {
    match result {
        Ok(results) => {
            let ok = results.iter().filter(|r| r.status == "ok").count();
            let failed: Vec<&str> = results
                .iter()
                .filter(|r| r.status != "ok")
                .map(|r| r.label.as_str())
                .collect();

            let mut text = format!("💡 {}: {} light(s) updated.", action, ok);
            if !failed.is_empty() {
                text.push_str(&format!(" Unreachable: {}", failed.join(", ")));
            }
            ctx.say(text).await?;
        }
        Err(e) => {
            if matches!(e, LightError::Api { .. } | LightError::Transport(_)) {
                tracing::error!(action, "Light command failed: {}", e);
            }
            ctx.send(
                poise::CreateReply::default()
                    .content(e.user_message())
                    .ephemeral(true),
            )
            .await?;
        }
    }
    Ok(())
}

macro_rules! lights_or_reply {
    ($ctx:expr) => {
        match $ctx.data().lights.as_deref() {
            Some(service) => service,
            None => {
                $ctx.send(
                    poise::CreateReply::default()
                        .content(NOT_CONFIGURED)
                        .ephemeral(true),
                )
                .await?;
                return Ok(());
            }
        }
    };
}

/// Control the LIFX lights.
#[poise::command(
    slash_command,
    guild_only,
    owners_only,
    subcommands(
        "list",
        "on",
        "off",
        "toggle",
        "color",
        "brightness",
        "pulse",
        "breathe",
        "alert"
    )
)]
pub async fn light(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// List lights and their state.
#[poise::command(slash_command, guild_only, owners_only)]
pub async fn list(
    ctx: Context<'_>,
    #[description = "Selector, e.g. all, label:Desk, group:Office"] selector: Option<String>,
) -> Result<(), Error> {
    let lights = lights_or_reply!(ctx);
    let found = match lights.list(selector.as_deref().unwrap_or("all")).await {
        Ok(found) => found,
        Err(e) => return report(ctx, "List", Err(e)).await,
    };

    if found.is_empty() {
        ctx.say("No lights found.").await?;
        return Ok(());
    }

    let lines: Vec<String> = found
        .iter()
        .map(|l| {
            let status = if !l.connected {
                "⚫ offline".to_string()
            } else if l.power == Power::On {
                format!("🟢 on · {:.0}%", l.brightness * 100.0)
            } else {
                "🔴 off".to_string()
            };
            let group = l
                .group
                .as_ref()
                .map(|g| format!(" ({})", g.name))
                .unwrap_or_default();
            format!("**{}**{} · {}", l.label, group, status)
        })
        .collect();

    let embed = serenity::CreateEmbed::new()
        .title("💡 Lights")
        .description(truncate(&lines.join("\n"), 4000))
        .color(0xFFD700);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Turn lights on.
#[poise::command(slash_command, guild_only, owners_only)]
pub async fn on(
    ctx: Context<'_>,
    #[description = "Selector (default: all)"] selector: Option<String>,
) -> Result<(), Error> {
    let lights = lights_or_reply!(ctx);
    let result = lights.power(selector.as_deref().unwrap_or("all"), Power::On).await;
    report(ctx, "On", result).await
}

/// Turn lights off.
#[poise::command(slash_command, guild_only, owners_only)]
pub async fn off(
    ctx: Context<'_>,
    #[description = "Selector (default: all)"] selector: Option<String>,
) -> Result<(), Error> {
    let lights = lights_or_reply!(ctx);
    let result = lights.power(selector.as_deref().unwrap_or("all"), Power::Off).await;
    report(ctx, "Off", result).await
}

/// Toggle lights.
#[poise::command(slash_command, guild_only, owners_only)]
pub async fn toggle(
    ctx: Context<'_>,
    #[description = "Selector (default: all)"] selector: Option<String>,
) -> Result<(), Error> {
    let lights = lights_or_reply!(ctx);
    let result = lights.toggle(selector.as_deref().unwrap_or("all")).await;
    report(ctx, "Toggle", result).await
}

/// Set the colour.
#[poise::command(slash_command, guild_only, owners_only)]
pub async fn color(
    ctx: Context<'_>,
    #[description = "red, #ff8800, kelvin:3500, hue:120 saturation:1"] color: String,
    #[description = "Selector (default: all)"] selector: Option<String>,
) -> Result<(), Error> {
    let lights = lights_or_reply!(ctx);
    let result = lights.color(selector.as_deref().unwrap_or("all"), &color).await;
    report(ctx, "Color", result).await
}

/// Set the brightness.
#[poise::command(slash_command, guild_only, owners_only)]
pub async fn brightness(
    ctx: Context<'_>,
    #[description = "Brightness in percent"]
    #[min = 0]
    #[max = 100]
    percent: u8,
    #[description = "Selector (default: all)"] selector: Option<String>,
) -> Result<(), Error> {
    let lights = lights_or_reply!(ctx);
    let result = lights
        .brightness(selector.as_deref().unwrap_or("all"), percent)
        .await;
    report(ctx, "Brightness", result).await
}

/// Flash a colour.
#[poise::command(slash_command, guild_only, owners_only)]
pub async fn pulse(
    ctx: Context<'_>,
    #[description = "Colour to flash"] color: String,
    #[description = "How many times (default 3)"] cycles: Option<u8>,
    #[description = "Selector (default: all)"] selector: Option<String>,
) -> Result<(), Error> {
    let lights = lights_or_reply!(ctx);
    let result = lights
        .pulse(
            selector.as_deref().unwrap_or("all"),
            &color,
            cycles.unwrap_or(3),
        )
        .await;
    report(ctx, "Pulse", result).await
}

/// Fade to a colour and back.
#[poise::command(slash_command, guild_only, owners_only)]
pub async fn breathe(
    ctx: Context<'_>,
    #[description = "Colour to breathe"] color: String,
    #[description = "How many times (default 3)"] cycles: Option<u8>,
    #[description = "Selector (default: all)"] selector: Option<String>,
) -> Result<(), Error> {
    let lights = lights_or_reply!(ctx);
    let result = lights
        .breathe(
            selector.as_deref().unwrap_or("all"),
            &color,
            cycles.unwrap_or(3),
        )
        .await;
    report(ctx, "Breathe", result).await
}

/// Get everyone's attention: three red flashes.
#[poise::command(slash_command, guild_only, owners_only)]
pub async fn alert(
    ctx: Context<'_>,
    #[description = "Selector (default: all)"] selector: Option<String>,
) -> Result<(), Error> {
    let lights = lights_or_reply!(ctx);
    let result = lights.alert(selector.as_deref().unwrap_or("all")).await;
    tracing::info!(user_id = ctx.author().id.get(), "Light alert triggered");
    report(ctx, "Alert", result).await
}
