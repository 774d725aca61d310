//! Forwarding-decision coverage for the relay.
//!
//! Drives the relay's stanza evaluation directly: for every office on the
//! allow-list a tagged bulletin yields exactly one forward decision, every
//! other office yields none, and the `every` wildcard forwards everything.

use minidom::Element;
use oirelay::bulletin::{JABBER_CLIENT_NS, NWWS_NS};
use oirelay::config::Config;
use oirelay::relay::Relay;

fn config(offices: &[&str]) -> Config {
    Config {
        username: "wx.example".to_owned(),
        password: "hunter2".to_owned(),
        server: "nwws-oi.weather.gov".to_owned(),
        port: 5222,
        use_tls: false,
        resource: "nwws".to_owned(),
        wfo_offices: offices.iter().map(|o| (*o).to_owned()).collect(),
        webhook_url: "https://discord.com/api/webhooks/1234/token".to_owned(),
        enable_notifications: false,
    }
}

fn bulletin_stanza(cccc: &str) -> Element {
    let ext = Element::builder("x", NWWS_NS)
        .attr("cccc", cccc)
        .attr("ttaaii", "WFUS54")
        .attr("awipsid", "TOROUN")
        .attr("id", "14894.1834")
        .append("TORNADO WARNING")
        .build();
    Element::builder("message", JABBER_CLIENT_NS)
        .attr("type", "groupchat")
        .append(
            Element::builder("body", JABBER_CLIENT_NS)
                .append("Tornado Warning issued")
                .build(),
        )
        .append(ext)
        .build()
}

fn forwarded_count(relay: &Relay, stanzas: &[Element]) -> usize {
    stanzas
        .iter()
        .filter(|stanza| relay.evaluate(stanza).is_some())
        .count()
}

#[test]
fn listed_office_forwards_exactly_once_per_bulletin() {
    let relay = Relay::new(config(&["OUN"]));
    let stanzas = vec![bulletin_stanza("OUN"), bulletin_stanza("LWX")];
    assert_eq!(forwarded_count(&relay, &stanzas), 1);
}

#[test]
fn unlisted_office_is_never_forwarded() {
    let relay = Relay::new(config(&["OUN"]));
    let stanzas = vec![bulletin_stanza("LWX"), bulletin_stanza("BOX")];
    assert_eq!(forwarded_count(&relay, &stanzas), 0);
}

#[test]
fn wildcard_forwards_every_bulletin() {
    let relay = Relay::new(config(&["every"]));
    let stanzas = vec![bulletin_stanza("OUN"), bulletin_stanza("LWX")];
    assert_eq!(forwarded_count(&relay, &stanzas), 2);
}

#[test]
fn filter_ignores_case_on_both_sides() {
    let relay = Relay::new(config(&["koun"]));
    let stanzas = vec![bulletin_stanza("KOUN")];
    assert_eq!(forwarded_count(&relay, &stanzas), 1);
}

#[test]
fn malformed_stanza_is_skipped_not_forwarded() {
    let relay = Relay::new(config(&["every"]));
    let no_extension = Element::builder("message", JABBER_CLIENT_NS)
        .attr("type", "groupchat")
        .append(
            Element::builder("body", JABBER_CLIENT_NS)
                .append("not a product")
                .build(),
        )
        .build();
    assert!(relay.evaluate(&no_extension).is_none());
}

#[test]
fn forwarded_bulletin_keeps_product_fields() {
    let relay = Relay::new(config(&["OUN"]));
    let stanza = bulletin_stanza("OUN");
    let bulletin = match relay.evaluate(&stanza) {
        Some(b) => b,
        None => panic!("listed office should be forwarded"),
    };
    assert_eq!(bulletin.cccc, "oun");
    assert_eq!(bulletin.ttaaii, "wfus54");
    assert_eq!(bulletin.title, "Tornado Warning issued");
    assert!(bulletin.text.contains("TORNADO WARNING"));
}
