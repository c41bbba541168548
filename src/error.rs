/// Turns a failed collection step into "no value" plus a log line.
///
/// Nothing in the collection path is fatal; the level reflects how unusual the failure is.
pub trait ResultOkLogExt<T, E> {
    /// Logs the error at `warn` level and discards it.
    fn ok_warn(self) -> Option<T>;

    /// Logs the error at `debug` level and discards it.
    fn ok_debug(self) -> Option<T>;

    /// Logs the error at `warn` level and falls back to `T::default()`.
    fn or_default_warn(self) -> T
    where
        T: Default;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_warn(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    fn ok_debug(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::debug!("{err}");
                None
            }
        }
    }

    fn or_default_warn(self) -> T
    where
        T: Default,
    {
        self.ok_warn().unwrap_or_default()
    }
}
