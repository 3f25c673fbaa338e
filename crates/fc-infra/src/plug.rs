use fc_core::PlugTypeId;

/// A connector standard with its rated power, e.g. `CCS 150 kW`.
#[derive(Clone, Debug, PartialEq)]
pub struct PlugType {
    pub id:          PlugTypeId,
    pub name:        String,
    pub capacity_kw: f64,
}
