//! GeoLite2 City database locator.

use std::net::IpAddr;

use maxminddb::{Reader, geoip2};

use super::{GeoInfo, GeoLocator};

/// Locator backed by a local MaxMind GeoLite2/GeoIP2 City database file.
pub struct MaxMindLocator {
    reader: Reader<Vec<u8>>,
}

impl MaxMindLocator {
    /// Opens the database file, reading it fully into memory.
    pub fn open(path: &str) -> Result<Self, maxminddb::MaxMindDbError> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self { reader })
    }
}

impl GeoLocator for MaxMindLocator {
    fn locate(&self, ip: &str) -> Option<GeoInfo> {
        let addr: IpAddr = ip.parse().ok()?;

        let result = self.reader.lookup(addr).ok()?;
        let record: geoip2::City = result.decode().ok()??;

        Some(GeoInfo {
            country: record.country.iso_code.map(String::from),
            city: record.city.names.english.map(String::from),
            region: record
                .subdivisions
                .first()
                .and_then(|s| s.names.english)
                .map(String::from),
            latitude: record.location.latitude,
            longitude: record.location.longitude,
        })
    }

    fn name(&self) -> &'static str {
        "maxmind"
    }
}
