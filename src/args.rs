use duration_string::DurationString;
use gumdrop::Options;

/// Run the configured actions on webhooks, and restart the services whose configs changed.
#[derive(Debug, Options)]
pub struct Args {
    /// The YAML file listing the actions to run on every trigger.
    #[options(free)]
    pub actions: Option<String>,

    /// Runs an HTTP server on the address, every request runs the actions.
    #[options(no_short)]
    pub http: Option<String>,

    /// Run the actions only once. This is the default without --http.
    #[options()]
    pub once: bool,

    /// The control endpoint receiving the restart requests.
    #[options(no_short, default = "http://localhost:6002/restart/service")]
    pub restart_url: String,

    /// How long to wait for the control endpoint.
    ///
    /// Can be a number postfixed with ms, s(econd), m(inutes)
    #[options(no_short, default = "10s")]
    pub restart_timeout: DurationString,

    /// The environment variable holding the key for the control endpoint.
    #[options(no_short, default = "STACKHOOK_AUTH_KEY")]
    pub auth_key_env: String,

    /// Increase verbosity, can be set multiple times (-v debug, -vv tracing)
    #[options(count)]
    pub verbose: u8,

    /// Only print error messages.
    #[options()]
    pub quiet: bool,

    /// Print the current version.
    #[options(short = "V")]
    pub version: bool,

    /// Print this help.
    #[options()]
    pub help: bool,
}

pub fn parse_args() -> Args {
    Args::parse_args_default_or_exit()
}
