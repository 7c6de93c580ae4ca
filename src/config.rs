use argh::FromArgs;
use log::LevelFilter;

/// Environment variable consulted for the log level when `--log-level` is absent.
pub const LOG_ENV: &str = "CHAINSH_LOG";

const DEFAULT_PROMPT_TAG: &str = "main";

#[derive(FromArgs, Debug)]
/// Line-oriented command interpreter supporting `;`, `&&`, `||`, `&` and `|`.
pub struct Args {
    #[argh(option, short = 'c')]
    /// evaluate a single line and exit with its status
    pub command: Option<String>,

    #[argh(option)]
    /// log verbosity: off, error, warn, info, debug or trace
    pub log_level: Option<LevelFilter>,

    #[argh(option)]
    /// label shown inside the prompt (default: main)
    pub prompt_tag: Option<String>,
}

/// Runtime configuration resolved from the command line and the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub command: Option<String>,
    pub log_level: LevelFilter,
    pub prompt_tag: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: None,
            log_level: LevelFilter::Warn,
            prompt_tag: DEFAULT_PROMPT_TAG.to_owned(),
        }
    }
}

impl Config {
    /// Merge parsed arguments with the value of [`LOG_ENV`], if any.
    ///
    /// An explicit `--log-level` wins; an unparsable environment value is ignored.
    pub fn resolve(args: Args, env_level: Option<&str>) -> Self {
        let defaults = Self::default();
        let log_level = args
            .log_level
            .or_else(|| env_level.and_then(|v| v.trim().parse().ok()))
            .unwrap_or(defaults.log_level);
        Self {
            command: args.command,
            log_level,
            prompt_tag: args.prompt_tag.unwrap_or(defaults.prompt_tag),
        }
    }

    /// Build the configuration for this process.
    pub fn from_env() -> Self {
        let args: Args = argh::from_env();
        let env_level = std::env::var(LOG_ENV).ok();
        Self::resolve(args, env_level.as_deref())
    }
}
