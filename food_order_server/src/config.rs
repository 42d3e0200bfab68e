use std::{env, fmt::Display, io::Write, str::FromStr, time::Duration as StdDuration};

use chrono::Duration;
use food_order_engine::db_types::RewardPolicy;
use fos_common::{parse_boolean_flag, Cents, Secret};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_FOS_HOST: &str = "127.0.0.1";
const DEFAULT_FOS_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/food_orders.db";
const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;
const DEFAULT_PUSH_HEARTBEAT_SECS: u64 = 15;
const MIN_TOKEN_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// How the reward ledger credits completed orders.
    pub reward_policy: RewardPolicy,
    /// Capacity of the event hook queues and of the push broadcast channel.
    pub event_buffer_size: usize,
    /// The interval between heartbeat frames on idle push streams.
    pub push_heartbeat: StdDuration,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FOS_HOST.to_string(),
            port: DEFAULT_FOS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            reward_policy: RewardPolicy::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            push_heartbeat: StdDuration::from_secs(DEFAULT_PUSH_HEARTBEAT_SECS),
            use_x_forwarded_for: false,
            use_forwarded: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("FOS_HOST").ok().unwrap_or_else(|| DEFAULT_FOS_HOST.into());
        let port = parse_value("FOS_PORT", env::var("FOS_PORT").ok(), DEFAULT_FOS_PORT);
        let database_url = env::var("FOS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ FOS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let reward_policy = reward_policy_from_env();
        let event_buffer_size =
            parse_value("FOS_EVENT_BUFFER_SIZE", env::var("FOS_EVENT_BUFFER_SIZE").ok(), DEFAULT_EVENT_BUFFER_SIZE)
                .max(1);
        let heartbeat_secs = parse_value(
            "FOS_PUSH_HEARTBEAT_SECS",
            env::var("FOS_PUSH_HEARTBEAT_SECS").ok(),
            DEFAULT_PUSH_HEARTBEAT_SECS,
        )
        .max(1);
        let use_x_forwarded_for = parse_boolean_flag(env::var("FOS_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("FOS_USE_FORWARDED").ok(), false);
        Self {
            host,
            port,
            database_url,
            auth,
            reward_policy,
            event_buffer_size,
            push_heartbeat: StdDuration::from_secs(heartbeat_secs),
            use_x_forwarded_for,
            use_forwarded,
        }
    }
}

fn reward_policy_from_env() -> RewardPolicy {
    let defaults = RewardPolicy::default();
    let per_delivery_credit = parse_value(
        "FOS_DELIVERY_CREDIT",
        env::var("FOS_DELIVERY_CREDIT").ok(),
        defaults.per_delivery_credit.value(),
    );
    let milestone_every =
        parse_value("FOS_MILESTONE_EVERY", env::var("FOS_MILESTONE_EVERY").ok(), defaults.milestone_every);
    let milestone_bonus =
        parse_value("FOS_MILESTONE_BONUS", env::var("FOS_MILESTONE_BONUS").ok(), defaults.milestone_bonus.value());
    let policy = RewardPolicy {
        per_delivery_credit: Cents::from(per_delivery_credit),
        milestone_every,
        milestone_bonus: Cents::from(milestone_bonus),
    };
    if policy.per_delivery_credit.is_negative() || policy.milestone_bonus.is_negative() {
        warn!("🪛️ Negative reward amounts are not allowed. Using the default reward policy instead.");
        return defaults;
    }
    if policy.milestone_every == 0 {
        info!("🪛️ Milestone bonuses are disabled.");
    }
    info!(
        "🪛️ Reward policy: {} per delivery, {} every {} completed orders",
        policy.per_delivery_credit, policy.milestone_bonus, policy.milestone_every
    );
    policy
}

/// Parses an optional configuration value, logging and falling back to `default` if it is missing or malformed.
fn parse_value<T>(name: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match value {
        None => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The key used to sign and verify bearer tokens.
    pub token_secret: Secret<String>,
    /// How long newly issued tokens remain valid.
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The token signing secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this since every issued token becomes invalid on restart. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => match writeln!(f, "FOS_TOKEN_SECRET={secret}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The token secret for this session was written to {}. If this is a production instance, \
                     you are doing it wrong! Set the FOS_TOKEN_SECRET environment variable instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the token secret to the temporary file. {e}"),
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the token secret.");
            },
        }
        Self { token_secret: Secret::new(secret), token_lifetime: Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, token_lifetime: Duration) -> Self {
        Self { token_secret: Secret::new(secret.into()), token_lifetime }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("FOS_TOKEN_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [FOS_TOKEN_SECRET]")))?;
        if secret.len() < MIN_TOKEN_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "FOS_TOKEN_SECRET must be at least {MIN_TOKEN_SECRET_LENGTH} characters long"
            )));
        }
        let hours = parse_value(
            "FOS_TOKEN_LIFETIME_HOURS",
            env::var("FOS_TOKEN_LIFETIME_HOURS").ok(),
            DEFAULT_TOKEN_LIFETIME_HOURS,
        );
        if hours <= 0 {
            return Err(ServerError::ConfigurationError("FOS_TOKEN_LIFETIME_HOURS must be positive".to_string()));
        }
        Ok(Self::new(secret, Duration::hours(hours)))
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub push_heartbeat: StdDuration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            use_x_forwarded_for: false,
            use_forwarded: false,
            push_heartbeat: StdDuration::from_secs(DEFAULT_PUSH_HEARTBEAT_SECS),
        }
    }
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            push_heartbeat: config.push_heartbeat,
        }
    }
}
