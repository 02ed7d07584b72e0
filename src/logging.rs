//! Diagnostic log output for host applications.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a global `tracing` subscriber for the SDK's diagnostics.
///
/// `RUST_LOG` wins when set. Otherwise the filter is `warn,toolsight=debug`
/// when `debug` is true and `warn` when it is not. Returns `false` if the
/// filter is malformed or the host already installed a subscriber; the
/// existing one is left alone.
pub fn init_tracing(debug: bool) -> bool {
    let default_directives = if debug { "warn,toolsight=debug" } else { "warn" };
    let Ok(filter) =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directives))
    else {
        return false;
    };

    let fmt_layer = fmt::layer().with_target(true).with_file(true).with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).try_init().is_ok()
}
