//! Bulletin extraction and office filtering.
//!
//! Every product on the NWWS-OI feed arrives as a groupchat message stanza
//! carrying an `<x/>` extension element in the `nwws-oi` namespace. The
//! extension's attributes identify the product; its text content is the full
//! product body.

use chrono::{DateTime, Utc};
use minidom::Element;

use crate::config::WILDCARD_OFFICE;

/// Namespace of the NWWS-OI product extension element.
pub const NWWS_NS: &str = "nwws-oi";

/// Namespace of ordinary client stanzas.
pub const JABBER_CLIENT_NS: &str = "jabber:client";

/// A single weather-service product received from the feed.
///
/// Transient: parsed on receipt, forwarded or discarded, never stored.
#[derive(Debug, Clone)]
pub struct Bulletin {
    /// Issuing office identifier (CCCC), lowercased as on the wire.
    pub cccc: String,

    /// WMO product heading (TTAAII).
    pub ttaaii: String,

    /// AWIPS product identifier.
    pub awipsid: String,

    /// Server-assigned message id.
    pub id: String,

    /// One-line product summary from the stanza body.
    pub title: String,

    /// Full product text.
    pub text: String,

    /// When this process received the bulletin.
    pub received_at: DateTime<Utc>,
}

/// Reasons a stanza could not be turned into a [`Bulletin`].
#[derive(Debug, thiserror::Error)]
pub enum BulletinError {
    /// The stanza carried no `<x/>` element in the NWWS-OI namespace.
    #[error("no nwws-oi extension element")]
    MissingExtension,

    /// The extension element lacked a required attribute.
    #[error("extension element missing attribute '{0}'")]
    MissingAttribute(&'static str),
}

impl Bulletin {
    /// Extract a bulletin from a groupchat message stanza.
    ///
    /// # Errors
    ///
    /// Returns [`BulletinError`] if the NWWS-OI extension element or one of
    /// its identifying attributes is absent. Such messages are skipped by
    /// the relay.
    pub fn from_stanza(stanza: &Element) -> Result<Self, BulletinError> {
        let ext = stanza
            .get_child("x", NWWS_NS)
            .ok_or(BulletinError::MissingExtension)?;

        let attr = |name: &'static str| {
            ext.attr(name)
                .map(str::to_lowercase)
                .ok_or(BulletinError::MissingAttribute(name))
        };

        let title = stanza
            .get_child("body", JABBER_CLIENT_NS)
            .map(Element::text)
            .unwrap_or_default();

        Ok(Self {
            cccc: attr("cccc")?,
            ttaaii: attr("ttaaii")?,
            awipsid: attr("awipsid")?,
            id: attr("id")?,
            title,
            text: ext.text(),
            received_at: Utc::now(),
        })
    }
}

/// Whether a bulletin issued by `cccc` passes the configured office list.
///
/// Comparison is case-insensitive; the word `every` anywhere in the list
/// matches all offices.
pub fn office_allowed(offices: &[String], cccc: &str) -> bool {
    offices
        .iter()
        .any(|office| office.eq_ignore_ascii_case(WILDCARD_OFFICE) || office.eq_ignore_ascii_case(cccc))
}
