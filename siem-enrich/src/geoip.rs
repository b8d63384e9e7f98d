//! GeoIP enrichment against a local MMDB (§4.4). A missing database is a
//! configuration choice, not an error: the enricher degrades to a no-op
//! rather than failing the event.

use crate::Enricher;
use maxminddb::{geoip2, Reader};
use serde_json::json;
use siem_schema::Event;
use std::net::IpAddr;
use std::path::Path;
use tracing::warn;

pub struct GeoIpEnricher {
    reader: Option<Reader<Vec<u8>>>,
}

impl GeoIpEnricher {
    /// Opens the MMDB at `path`. A missing or unreadable file is logged and
    /// treated as "no database" rather than a startup failure -- GeoIP is
    /// optional enrichment, not a mandatory dependency.
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Self {
        let reader = path.and_then(|p| match Reader::open_readfile(p.as_ref()) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(error = %e, path = %p.as_ref().display(), "GeoIP database unavailable, enricher is a no-op");
                None
            }
        });
        GeoIpEnricher { reader }
    }

    pub fn disabled() -> Self {
        GeoIpEnricher { reader: None }
    }

    fn lookup(&self, ip: IpAddr) -> Option<serde_json::Value> {
        let reader = self.reader.as_ref()?;
        let city: geoip2::City = reader.lookup(ip).ok()??;
        let country_name = city
            .country
            .as_ref()
            .and_then(|c| c.names.as_ref())
            .and_then(|n| n.get("en"))
            .copied();
        let country_iso_code = city.country.as_ref().and_then(|c| c.iso_code);
        let continent_name = city
            .continent
            .as_ref()
            .and_then(|c| c.names.as_ref())
            .and_then(|n| n.get("en"))
            .copied();
        let city_name = city
            .city
            .as_ref()
            .and_then(|c| c.names.as_ref())
            .and_then(|n| n.get("en"))
            .copied();
        let postal_code = city.postal.as_ref().and_then(|p| p.code);
        let timezone = city.location.as_ref().and_then(|l| l.time_zone);
        let lat = city.location.as_ref().and_then(|l| l.latitude);
        let lon = city.location.as_ref().and_then(|l| l.longitude);

        Some(json!({
            "city_name": city_name,
            "country_name": country_name,
            "country_iso_code": country_iso_code,
            "continent_name": continent_name,
            "postal_code": postal_code,
            "timezone": timezone,
            "location": { "lat": lat, "lon": lon },
        }))
    }
}

#[async_trait::async_trait]
impl Enricher for GeoIpEnricher {
    fn name(&self) -> &'static str {
        "geoip"
    }

    async fn enrich(&self, event: &mut Event) {
        if self.reader.is_none() {
            return;
        }
        for field in ["source", "destination"] {
            let ip_path = format!("{field}.ip");
            let Some(ip_str) = event.get_path(&ip_path).and_then(|v| v.as_str()) else {
                continue;
            };
            let Ok(ip) = ip_str.parse::<IpAddr>() else {
                continue;
            };
            if let Some(geo) = self.lookup(ip) {
                event.set_path(&format!("{field}.geo"), geo);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn disabled_enricher_is_noop() {
        let enricher = GeoIpEnricher::disabled();
        let mut event = Event::from_value(json!({"source": {"ip": "8.8.8.8"}}));
        enricher.enrich(&mut event).await;
        assert!(event.get_path("source.geo").is_none());
    }

    #[tokio::test]
    async fn missing_ip_field_is_noop() {
        let enricher = GeoIpEnricher::disabled();
        let mut event = Event::from_value(json!({"message": "hi"}));
        enricher.enrich(&mut event).await;
        assert!(event.get_path("source.geo").is_none());
    }
}
