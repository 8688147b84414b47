// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tracing` + `tracing-subscriber` setup (§4.10): env-filter driven by
//! `RUST_LOG`, plus a rotating file appender alongside stderr when a log
//! directory is configured.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Guard that must be kept alive for the process lifetime so the
/// non-blocking file writer keeps flushing.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

pub fn init(log_dir: Option<&str>) -> LoggingGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "fleet-control.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            registry.with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)).init();
            LoggingGuard { _file_guard: Some(guard) }
        }
        None => {
            registry.init();
            LoggingGuard { _file_guard: None }
        }
    }
}
