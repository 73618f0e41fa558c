//! Static registry of seller cabinets on both marketplaces.
//!
//! Wildberries output rows are filtered to suppliers listed here (after
//! `WB_CABINET_ID_*` overrides); anything else in a brand catalog belongs to
//! a third-party reseller and is dropped.

/// A Wildberries seller cabinet: env-var key suffix plus supplier id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WbCabinet {
    pub key: &'static str,
    pub supplier_id: u64,
}

/// Known Wildberries cabinets with their default supplier ids.
///
/// `WB_CABINET_ID_{KEY}` may override the id at runtime; see
/// [`crate::WbSettings`].
pub const WB_CABINETS: [WbCabinet; 6] = [
    WbCabinet { key: "MAU", supplier_id: 53_607 },
    WbCabinet { key: "MAB", supplier_id: 121_614 },
    WbCabinet { key: "MMA", supplier_id: 174_711 },
    WbCabinet { key: "COSMO", supplier_id: 224_650 },
    WbCabinet { key: "DREAMLAB", supplier_id: 1_140_223 },
    WbCabinet { key: "BEAUTYLAB", supplier_id: 4_428_365 },
];

/// Ozon sellers we own, keyed by seller id.
const OZON_SELLERS: [(u64, &str); 1] = [(176_640, "COSMO_BEAUTY")];

/// Returns the cabinet label for an Ozon seller id, or `UNKNOWN_{id}`.
#[must_use]
pub fn ozon_cabinet_name(seller_id: u64) -> String {
    OZON_SELLERS
        .iter()
        .find(|(id, _)| *id == seller_id)
        .map_or_else(|| format!("UNKNOWN_{seller_id}"), |(_, name)| (*name).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ozon_cabinet_known_and_unknown() {
        assert_eq!(ozon_cabinet_name(176_640), "COSMO_BEAUTY");
        assert_eq!(ozon_cabinet_name(42), "UNKNOWN_42");
    }

    #[test]
    fn wb_cabinet_keys_are_unique() {
        let mut keys: Vec<&str> = WB_CABINETS.iter().map(|c| c.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), WB_CABINETS.len());
    }
}
