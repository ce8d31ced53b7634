use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 預設的過濾規則，debug 以上的詳細等級也開放其他 crate 的 info
pub fn default_directive(level: &str) -> String {
    match level {
        "trace" | "debug" => format!("callhost={},info", level),
        _ => format!("callhost={}", level),
    }
}

/// RUST_LOG 有設定時優先，否則使用設定檔的等級
pub fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level)))
}

/// stdout 是傳輸通道，日誌一律寫到 stderr
pub fn init_cli_logger(level: &str, json: bool) {
    let registry = tracing_subscriber::registry().with(build_env_filter(level));

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level_reaches_filter() {
        assert_eq!(default_directive("warn"), "callhost=warn");
        assert_eq!(default_directive("error"), "callhost=error");
        assert_eq!(default_directive("info"), "callhost=info");
        assert_eq!(default_directive("trace"), "callhost=trace,info");

        let filter = EnvFilter::new(default_directive("warn"));
        assert!(filter.to_string().contains("callhost=warn"));
    }
}
