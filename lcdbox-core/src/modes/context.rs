//! What a running mode gets to work with.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::cancel::{CancelToken, Cancelled};
use crate::config::FetchConfig;
use crate::traits::{Connectivity, Display, DisplayError, FetchError, Platform};

/// Errors that end a mode run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeError {
    /// Cancellation observed; not a failure
    Cancelled,
    /// Drawing failed
    Display(DisplayError),
    /// Mode needs the connectivity handle but was not given one
    MissingCapability,
    /// Mode cannot start with what it was given
    Setup,
}

impl From<Cancelled> for ModeError {
    fn from(_: Cancelled) -> Self {
        ModeError::Cancelled
    }
}

impl From<DisplayError> for ModeError {
    fn from(e: DisplayError) -> Self {
        ModeError::Display(e)
    }
}

/// Collaborators lent to one mode run
///
/// `link` is only present for `Connected` modes.
pub struct ModeContext<'a, M: RawMutex, D, C, P> {
    pub display: &'a mut D,
    pub platform: &'a mut P,
    pub fetch: &'a FetchConfig,
    link: Option<&'a C>,
    cancel: &'a CancelToken<M>,
}

impl<'a, M, D, C, P> ModeContext<'a, M, D, C, P>
where
    M: RawMutex,
    D: Display,
    C: Connectivity,
    P: Platform,
{
    pub fn new(
        display: &'a mut D,
        platform: &'a mut P,
        fetch: &'a FetchConfig,
        link: Option<&'a C>,
        cancel: &'a CancelToken<M>,
    ) -> Self {
        Self {
            display,
            platform,
            fetch,
            link,
            cancel,
        }
    }

    /// Connectivity handle; only `Connected` modes have one
    pub fn link(&self) -> Result<&'a C, ModeError> {
        self.link.ok_or(ModeError::MissingCapability)
    }

    /// Sleep, waking early with `Err(Cancelled)` if the mode is cancelled
    pub async fn sleep_ms(&mut self, ms: u32) -> Result<(), Cancelled> {
        self.cancel.guard(self.platform.delay_ms(ms)).await
    }

    /// GET over the link with the configured deadline
    ///
    /// The outer result carries cancellation; the inner one the request
    /// outcome, which modes log and ride out.
    pub async fn fetch<'b>(
        &mut self,
        host: &str,
        path: &str,
        buf: &'b mut [u8],
    ) -> Result<Result<&'b [u8], FetchError>, ModeError> {
        let link = self.link()?;
        let deadline = self.fetch.timeout_ms();
        let request = select(link.http_get(host, path, buf), self.platform.delay_ms(deadline));
        match self.cancel.guard(request).await? {
            Either::First(result) => Ok(result),
            Either::Second(()) => Ok(Err(FetchError::Timeout)),
        }
    }
}
