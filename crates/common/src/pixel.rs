//! Win-notice pixel delivery.
//!
//! Pixels are fire-and-forget: [`WinNoticeFirer::fire`] logs delivery
//! failures and never returns them.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use error_stack::{Report, ResultExt};
use url::Url;

use crate::auction::PixelTransport;
use crate::error::AdapterError;

/// Timeout for a single pixel GET.
const PIXEL_TIMEOUT: Duration = Duration::from_secs(5);

/// Fires win-notice pixels through a [`PixelTransport`].
#[derive(Clone)]
pub struct WinNoticeFirer {
    transport: Arc<dyn PixelTransport>,
}

impl WinNoticeFirer {
    #[must_use]
    pub fn new(transport: Arc<dyn PixelTransport>) -> Self {
        Self { transport }
    }

    /// Issue one GET for the percent-decoded `pixel_url`. Empty input is a
    /// no-op; a URL that fails to decode is requested as given.
    ///
    /// The decoded URL is normalized with [`Url::parse`], which re-escapes
    /// characters a request URI cannot carry (`summer%20sale` decodes to a
    /// space and goes out as `%20` again).
    pub fn fire(&self, pixel_url: &str) {
        if pixel_url.is_empty() {
            return;
        }

        let decoded = urlencoding::decode(pixel_url).unwrap_or_else(|err| {
            log::debug!("Pixel URL is not valid percent-encoding ({err}), firing as given");
            Cow::Borrowed(pixel_url)
        });

        let request = match Url::parse(&decoded)
            .change_context(AdapterError::Pixel {
                message: format!("Invalid pixel URL '{decoded}'"),
            })
            .and_then(|url| {
                http::Request::get(url.as_str())
                    .body(())
                    .change_context(AdapterError::Pixel {
                        message: format!("Invalid pixel URI '{url}'"),
                    })
            }) {
            Ok(request) => request,
            Err(report) => {
                log::warn!("Win notice not sent: {report:?}");
                return;
            }
        };

        log::debug!("Firing win notice pixel {}", request.uri());
        if let Err(report) = self.transport.send(request) {
            log::warn!("Win notice pixel failed: {report:?}");
        }
    }
}

/// Blocking [`PixelTransport`] built on `ureq`.
pub struct UreqPixelTransport {
    agent: ureq::Agent,
}

impl UreqPixelTransport {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqPixelTransport {
    fn default() -> Self {
        Self::new(PIXEL_TIMEOUT)
    }
}

impl PixelTransport for UreqPixelTransport {
    fn send(&self, request: http::Request<()>) -> Result<(), Report<AdapterError>> {
        let uri = request.uri().to_string();
        self.agent
            .get(uri.as_str())
            .call()
            .change_context(AdapterError::Pixel {
                message: format!("GET {uri} failed"),
            })?;
        Ok(())
    }
}
