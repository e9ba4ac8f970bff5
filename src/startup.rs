use crate::commands::{create_error_embed, get_all_application_commands, CommandContext, Context};
use crate::components::booking::{Booking, HttpBookingSource};
use crate::components::ComponentManager;
use crate::config::Config;
use crate::error::{config_error, BotResult, Error};
use crate::shutdown;
use chrono_tz::Tz;
use poise::serenity_prelude as serenity;
use rust_i18n::t;
use serenity::model::user::OnlineStatus;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,serenity=warn,poise=warn,reqwest=warn")
        }))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the config and check the booking settings before connecting
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {:?}", e);
        e
    })?;
    check_booking_settings(&config)?;
    Ok(Arc::new(RwLock::new(config)))
}

/// Fail at startup on booking settings that would break every booking
pub fn check_booking_settings(config: &Config) -> BotResult<()> {
    if !config.is_component_enabled("booking") {
        warn!("Booking component is disabled, only utility commands are available");
        return Ok(());
    }

    // Builds the HTTP client and validates the server URL
    HttpBookingSource::from_config(config)?;

    config
        .timezone
        .parse::<Tz>()
        .map_err(|_| config_error(&format!("Unknown TIMEZONE '{}'", config.timezone)))?;

    info!(
        "Booking server {} (timeout {}s), fallback time zone {}, {:?} clock, {} year window",
        config.booking_api_url,
        config.request_timeout_secs,
        config.timezone,
        config.clock_format,
        config.year_window
    );
    Ok(())
}

/// Commands offered with the given config
pub fn application_commands(config: &Config) -> Vec<poise::Command<CommandContext, Error>> {
    let booking_enabled = config.is_component_enabled("booking");
    get_all_application_commands()
        .into_iter()
        .filter(|command| booking_enabled || command.name != "booking")
        .collect()
}

/// Initialize and start the Discord bot
pub async fn start_bot(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let (token, activity, commands) = {
        let config_read = config.read().await;

        crate::utils::i18n::set_locale(&config_read.bot_locale);
        info!("Setting locale to {}", config_read.bot_locale);

        (
            config_read.discord_token.clone(),
            config_read.activity.clone(),
            application_commands(&config_read),
        )
    };

    let options = poise::FrameworkOptions {
        commands,
        on_error: |error| Box::pin(on_error(error)),
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some("!".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    let intents = serenity::GatewayIntents::non_privileged();

    // The booking component owns every facilitator's session
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    component_manager.register(Booking::new());
    let component_manager = Arc::new(component_manager);

    let command_data = CommandContext::new(Arc::clone(&config))
        .with_component_manager(Arc::clone(&component_manager));

    // Spawn signal handler task
    let (shutdown_send, shutdown_recv) = oneshot::channel();
    let shutdown_components = Arc::clone(&component_manager);
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components).await;
    });

    let client_result = poise::serenity_prelude::ClientBuilder::new(token, intents)
        .framework(poise::Framework::new(
            options,
            move |ctx, ready, framework| {
                Box::pin(async move {
                    info!("{} is connected!", ready.user.name);

                    ctx.set_presence(
                        Some(serenity::ActivityData::playing(&activity)),
                        OnlineStatus::Online,
                    );
                    info!("Setting activity to {}", activity);

                    // Starts the booking actor before any command can reach it
                    if let Err(e) = component_manager.init_all(ctx).await {
                        error!("Failed to initialize components: {:?}", e);
                    }

                    if let Err(e) =
                        poise::builtins::register_globally(ctx, &framework.options().commands).await
                    {
                        error!("Failed to register slash commands: {:?}", e);
                    } else {
                        info!(
                            "Registered {} slash commands",
                            framework.options().commands.len()
                        );
                    }

                    Ok(command_data)
                })
            },
        ))
        .await;

    info!("Starting bot...");
    let mut client = client_result.map_err(Error::from)?;

    let client_handle = tokio::spawn(async move { client.start().await.map_err(Error::from) });

    // Wait for either the client to end or a shutdown signal
    tokio::select! {
        result = client_handle => {
            info!("Bot process ended");
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => {
                    error!("Client task error: {:?}", e);
                    Err(Error::Other(format!("Client task error: {}", e)).into())
                }
            }
        }
        _ = shutdown_recv => {
            info!("Received shutdown signal, booking sessions were closed");
            Ok(())
        }
    }
}

async fn send_error(ctx: Context<'_>, context: &str, message: &str) {
    if let Err(e) = ctx
        .send(
            poise::CreateReply::default()
                .embed(create_error_embed(
                    &t!("error_title", context = context),
                    message,
                ))
                .ephemeral(true),
        )
        .await
    {
        error!("Error while sending error message: {:?}", e);
    }
}

/// Handle errors from commands
async fn on_error(error: poise::FrameworkError<'_, CommandContext, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Error during setup: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command '{}': {:?}", ctx.command().qualified_name, error);
            send_error(ctx, "command", &error.to_string()).await;
        }
        poise::FrameworkError::ArgumentParse { error, input, ctx, .. } => {
            // Typically a day or slot number that is not a number
            warn!(
                "Bad argument for '{}': {:?} ({})",
                ctx.command().qualified_name,
                input,
                error
            );
            let message = t!(
                "invalid_argument",
                input = input.unwrap_or_default(),
                command = ctx.command().qualified_name.as_str()
            );
            send_error(ctx, "command", &message).await;
        }
        poise::FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            if let Some(error) = error {
                error!("Command check failed: {:?}", error);
                send_error(ctx, "check", &error.to_string()).await;
            }
        }
        error => {
            error!("Other error: {:?}", error);
        }
    }
}
