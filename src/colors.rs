//! Highlight palettes and the per-order color assignment.

use serde::Serialize;

/// 24-bit RGB color, `0xRRGGBB`.
pub type Rgb = u32;

/// Strong colors cycled through for scanned products.
pub const SCAN_PALETTE: [Rgb; 8] = [
    0xFFFF00, // amarelo
    0x90EE90, // verde claro
    0xFFB6C1, // rosa claro
    0x87CEEB, // azul claro
    0xFFD700, // dourado
    0xFFA500, // laranja
    0xDDA0DD, // ameixa
    0xF0E68C, // cáqui
];

/// Softer background tones assigned to orders.
pub const ORDER_PALETTE: [Rgb; 8] = [
    0xE8F4F8, // azul muito claro
    0xFFF4E6, // laranja muito claro
    0xF0F8E8, // verde muito claro
    0xFFF0F5, // rosa muito claro
    0xF5F5DC, // bege
    0xE6E6FA, // lavanda
    0xF0FFF0, // verde menta claro
    0xFFF8DC, // cornsilk
];

/// Hex form without a leading `#`, as used in the UI and the export report.
pub fn hex(color: Rgb) -> String {
    format!("{:06X}", color)
}

/// Colors assigned to orders, in the order they were first filtered to.
///
/// Assignment is deterministic: the n-th distinct order gets
/// `ORDER_PALETTE[n % 8]`. Entries are never removed or reassigned within a
/// session; the map is only dropped wholesale when a new file is loaded.
#[derive(Debug, Default, Clone)]
pub struct OrderColorMap {
    assigned: Vec<(String, Rgb)>,
}

#[derive(Serialize)]
pub struct OrderColorEntry<'a> {
    pub order: &'a str,
    pub color: String,
}

impl OrderColorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color for `order`, assigning the next palette entry on first sight.
    pub fn assign(&mut self, order: &str) -> Rgb {
        if let Some(color) = self.get(order) {
            return color;
        }
        let color = ORDER_PALETTE[self.assigned.len() % ORDER_PALETTE.len()];
        self.assigned.push((order.to_string(), color));
        color
    }

    pub fn get(&self, order: &str) -> Option<Rgb> {
        self.assigned
            .iter()
            .find(|(o, _)| o == order)
            .map(|&(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.assigned.iter().map(|&(ref o, c)| (o.as_str(), c))
    }

    pub fn entries(&self) -> Vec<OrderColorEntry<'_>> {
        self.assigned
            .iter()
            .map(|&(ref o, c)| OrderColorEntry {
                order: o,
                color: hex(c),
            })
            .collect()
    }
}
