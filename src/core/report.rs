use crate::domain::model::{AssetEntitlement, OutputRow, MISSING_FIELD};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;

pub const REPORT_HEADER: [&str; 15] = [
    "id",
    "serviceTag",
    "orderBuid",
    "shipDate",
    "productCode",
    "localChannel",
    "productLineDescription",
    "productLobDescription",
    "countryCode",
    "entitlement_itemNumber",
    "entitlement_startDate",
    "entitlement_endDate",
    "entitlement_entitlementType",
    "entitlement_serviceLevelCode",
    "entitlement_serviceLevelDescription",
];

fn cell(value: &Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING_FIELD.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// One row per entitlement line, assets and lines in response order. Assets
/// without entitlement lines contribute nothing.
pub fn flatten(assets: &[AssetEntitlement]) -> Vec<OutputRow> {
    assets
        .iter()
        .flat_map(|asset| {
            asset.entitlement_lines().iter().map(move |line| OutputRow {
                id: cell(&asset.id),
                service_tag: cell(&asset.service_tag),
                order_buid: cell(&asset.order_buid),
                ship_date: cell(&asset.ship_date),
                product_code: cell(&asset.product_code),
                local_channel: cell(&asset.local_channel),
                product_line_description: cell(&asset.product_line_description),
                product_lob_description: cell(&asset.product_lob_description),
                country_code: cell(&asset.country_code),
                item_number: cell(&line.item_number),
                start_date: cell(&line.start_date),
                end_date: cell(&line.end_date),
                entitlement_type: cell(&line.entitlement_type),
                service_level_code: cell(&line.service_level_code),
                service_level_description: cell(&line.service_level_description),
            })
        })
        .collect()
}

/// Renders the header and every row as CSV. The header is written even when
/// there are no rows.
pub fn render_report(rows: &[OutputRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_HEADER)?;
    for row in rows {
        writer.write_record(row.as_record())?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::Io(e.into_error()))
}
