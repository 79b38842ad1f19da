use chrono::NaiveDateTime;
use postgres::Row;
use serde_json::Value as JsonValue;

use crate::value::CellValue;

/// Materialize one cell of a `postgres` row into a [`CellValue`].
///
/// Dispatches on the column's type name; anything unrecognized is read as
/// text, which covers the long tail of string-like backend types.
pub(super) fn extract_cell(row: &Row, idx: usize) -> Result<CellValue, postgres::Error> {
    let type_name = row.columns()[idx].type_().name();

    match type_name {
        "int2" => {
            let val: Option<i16> = row.try_get(idx)?;
            Ok(val.map_or(CellValue::Null, |v| CellValue::Int(i64::from(v))))
        }
        "int4" => {
            let val: Option<i32> = row.try_get(idx)?;
            Ok(val.map_or(CellValue::Null, |v| CellValue::Int(i64::from(v))))
        }
        "int8" => {
            let val: Option<i64> = row.try_get(idx)?;
            Ok(val.map_or(CellValue::Null, CellValue::Int))
        }
        "float4" => {
            let val: Option<f32> = row.try_get(idx)?;
            Ok(val.map_or(CellValue::Null, |v| CellValue::Float(f64::from(v))))
        }
        "float8" => {
            let val: Option<f64> = row.try_get(idx)?;
            Ok(val.map_or(CellValue::Null, CellValue::Float))
        }
        "bool" => {
            let val: Option<bool> = row.try_get(idx)?;
            Ok(val.map_or(CellValue::Null, CellValue::Bool))
        }
        "timestamp" => {
            let val: Option<NaiveDateTime> = row.try_get(idx)?;
            Ok(val.map_or(CellValue::Null, CellValue::Timestamp))
        }
        "timestamptz" => {
            let val: Option<chrono::DateTime<chrono::Utc>> = row.try_get(idx)?;
            Ok(val.map_or(CellValue::Null, |v| CellValue::Timestamp(v.naive_utc())))
        }
        "json" | "jsonb" => {
            let val: Option<JsonValue> = row.try_get(idx)?;
            Ok(val.map_or(CellValue::Null, CellValue::Json))
        }
        "bytea" => {
            let val: Option<Vec<u8>> = row.try_get(idx)?;
            Ok(val.map_or(CellValue::Null, CellValue::Bytes))
        }
        _ => {
            let val: Option<String> = row.try_get(idx)?;
            Ok(val.map_or(CellValue::Null, CellValue::Text))
        }
    }
}
