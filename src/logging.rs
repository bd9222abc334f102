pub use log::LevelFilter::*;

pub fn setup_logging(verbosity: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .level(verbosity)
        .format(|out, message, record| out.finish(format_args!("({}) {}: {}", record.level(), record.target(), message)))
        .chain(std::io::stderr())
        .apply()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_installs() {
        assert!(setup_logging(Debug).is_ok());
        assert_eq!(log::max_level(), Debug);

        log::debug!("logging ready");
    }
}
