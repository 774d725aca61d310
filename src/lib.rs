//! oirelay — a bulletin relay for NWWS-OI.
//!
//! Signs in to the NWWS Open Interface XMPP feed, joins the bulletin room,
//! filters products by issuing Weather Forecast Office, and forwards each
//! match to a webhook and an optional desktop notification.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bulletin;
pub mod config;
pub mod logging;
pub mod notify;
pub mod relay;
pub mod webhook;
