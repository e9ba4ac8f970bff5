use crate::commands::{
    create_error_embed, create_info_embed, create_success_embed, CommandResult, Context,
};
use crate::components::booking::{render, Booking, BookingHandle, ViewState};
use crate::error::{component_error, BotResult, Error};
use poise::serenity_prelude as serenity;
use rust_i18n::t;
use tracing::{debug, warn};

/// Book a time slot from an event container
#[poise::command(
    slash_command,
    prefix_command,
    subcommands("open", "month", "year", "date", "slot", "confirm", "back", "cancel"),
    subcommand_required
)]
pub async fn booking(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Start booking against an event container
#[poise::command(slash_command, prefix_command)]
pub async fn open(
    ctx: Context<'_>,
    #[description = "Event container id"] event_id: String,
) -> CommandResult {
    ctx.defer_ephemeral().await?;
    let handle = booking_handle(ctx).await?;
    let result = handle.open(user_id(ctx), event_id).await;
    reply_with_view(ctx, result).await
}

/// Show an earlier or later month
#[poise::command(slash_command, prefix_command)]
pub async fn month(
    ctx: Context<'_>,
    #[description = "Months to move, e.g. 1 or -1"] offset: i32,
) -> CommandResult {
    let handle = booking_handle(ctx).await?;
    let result = handle.shift_months(user_id(ctx), offset).await;
    reply_with_view(ctx, result).await
}

/// Show the same month in an earlier or later year
#[poise::command(slash_command, prefix_command)]
pub async fn year(
    ctx: Context<'_>,
    #[description = "Years to move, e.g. 1 or -1"] offset: i32,
) -> CommandResult {
    let handle = booking_handle(ctx).await?;
    let result = handle.shift_years(user_id(ctx), offset).await;
    reply_with_view(ctx, result).await
}

/// Pick a day of the shown month
#[poise::command(slash_command, prefix_command)]
pub async fn date(
    ctx: Context<'_>,
    #[description = "Day of the month"]
    #[min = 1]
    #[max = 31]
    day: u32,
) -> CommandResult {
    // Booked times are fetched before we answer
    ctx.defer_ephemeral().await?;
    let handle = booking_handle(ctx).await?;
    let result = handle.select_date(user_id(ctx), day).await;
    reply_with_view(ctx, result).await
}

/// Pick a time slot by its number in the list
#[poise::command(slash_command, prefix_command)]
pub async fn slot(
    ctx: Context<'_>,
    #[description = "Slot number"]
    #[min = 1]
    number: usize,
) -> CommandResult {
    let handle = booking_handle(ctx).await?;
    let result = handle
        .select_slot(user_id(ctx), number.saturating_sub(1))
        .await;
    reply_with_view(ctx, result).await
}

/// Confirm the selected date and time
#[poise::command(slash_command, prefix_command)]
pub async fn confirm(ctx: Context<'_>) -> CommandResult {
    let handle = booking_handle(ctx).await?;
    match handle.confirm(user_id(ctx)).await {
        Ok((selection, _view)) => {
            ctx.send(
                poise::CreateReply::default()
                    .embed(create_success_embed(
                        &t!("booking_confirmed_title"),
                        &render::render_selection(&selection),
                    ))
                    .ephemeral(true),
            )
            .await?;
            Ok(())
        }
        Err(e) => reply_with_error(ctx, e).await,
    }
}

/// Go back from confirmation to choosing a time
#[poise::command(slash_command, prefix_command)]
pub async fn back(ctx: Context<'_>) -> CommandResult {
    let handle = booking_handle(ctx).await?;
    let result = handle.back(user_id(ctx)).await;
    reply_with_view(ctx, result).await
}

/// Cancel the booking in progress
#[poise::command(slash_command, prefix_command)]
pub async fn cancel(ctx: Context<'_>) -> CommandResult {
    let handle = booking_handle(ctx).await?;
    match handle.close(user_id(ctx)).await {
        Ok(()) => {
            ctx.send(
                poise::CreateReply::default()
                    .embed(create_info_embed(
                        &t!("booking_cancelled_title"),
                        &t!("booking_cancelled"),
                    ))
                    .ephemeral(true),
            )
            .await?;
            Ok(())
        }
        Err(e) => reply_with_error(ctx, e).await,
    }
}

fn user_id(ctx: Context<'_>) -> u64 {
    ctx.author().id.get()
}

/// Get the running booking component's handle
async fn booking_handle(ctx: Context<'_>) -> BotResult<BookingHandle> {
    let component_manager = ctx
        .data()
        .component_manager
        .as_ref()
        .ok_or_else(|| component_error("ComponentManager not available"))?;

    let component = component_manager
        .get_component_by_name("booking")
        .ok_or_else(|| component_error("Booking component not registered"))?;

    let booking = component
        .as_any()
        .downcast_ref::<Booking>()
        .ok_or_else(|| component_error("Could not downcast booking component"))?;

    debug!("Using booking component from ComponentManager");
    booking
        .get_handle()
        .await
        .ok_or_else(|| component_error("Booking component is not running"))
}

async fn reply_with_view(ctx: Context<'_>, result: BotResult<ViewState>) -> CommandResult {
    match result {
        Ok(view) => {
            let embed = view_embed(&view)?;
            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await?;
            Ok(())
        }
        Err(e) => reply_with_error(ctx, e).await,
    }
}

async fn reply_with_error(ctx: Context<'_>, error: Error) -> CommandResult {
    warn!("Booking command failed for {}: {}", ctx.author().name, error);
    let message = if error.is_container_misconfiguration() {
        t!("booking_misconfigured", error = error.to_string()).to_string()
    } else {
        error.to_string()
    };
    ctx.send(
        poise::CreateReply::default()
            .embed(create_error_embed(
                &t!("error_title", context = "booking"),
                &message,
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

fn view_embed(view: &ViewState) -> BotResult<serenity::CreateEmbed> {
    let title = match &view.availability.event_name {
        Some(name) => format!("{} | {}", name, render::month_title(view)),
        None => render::month_title(view),
    };
    let description = format!(
        "{}\n{}",
        render::status_line(view),
        render::render_month(view)?
    );

    let mut embed = create_info_embed(&title, &description).footer(
        serenity::CreateEmbedFooter::new(t!(
            "booking_time_zone",
            time_zone = view.availability.time_zone.name()
        )),
    );
    if view.selected_date.is_some() {
        embed = embed.field(t!("booking_times_field"), render::render_slots(view), false);
    }
    Ok(embed)
}
