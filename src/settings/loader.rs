//! Settings file and EIOPA risk-free curve inputs

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;

use super::Settings;
use crate::assets::loader::parse_date;
use crate::curves::TermStructure;
use crate::error::{AlmError, Result};

/// Number of scalar parameter rows at the top of the EIOPA parameter file
pub const EIOPA_SCALAR_ROWS: usize = 6;

#[derive(Debug, Deserialize)]
struct ParameterRow {
    #[serde(rename = "Parameter")]
    parameter: String,
    #[serde(rename = "Value")]
    value: String,
}

fn required<'a>(values: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    values
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| AlmError::Parse(format!("missing parameter {}", key)))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AlmError::Parse(format!("invalid value for {}: {:?}", key, value)))
}

/// Load run settings from a two-column `Parameter,Value` CSV
pub fn load_settings_from_reader<R: Read>(reader: R, base_dir: &Path) -> Result<Settings> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut values = HashMap::new();
    for result in csv_reader.deserialize() {
        let row: ParameterRow = result?;
        values.insert(row.parameter, row.value);
    }

    Settings::new(
        base_dir.join(required(&values, "EIOPA_param_file")?),
        base_dir.join(required(&values, "EIOPA_curves_file")?),
        required(&values, "country")?,
        required(&values, "run_type")?,
        parse_number("n_proj_years", required(&values, "n_proj_years")?)?,
        parse_number("Precision", required(&values, "Precision")?)?,
        parse_number("Tau", required(&values, "Tau")?)?,
        parse_number("compounding", required(&values, "compounding")?)?,
        parse_date(required(&values, "Modelling_Date")?)?,
    )
}

/// Load run settings; EIOPA file names are resolved against the settings file's directory
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    load_settings_from_reader(std::fs::File::open(path)?, base_dir)
}

/// Risk-free curve of one country as published by EIOPA
#[derive(Debug, Clone)]
pub struct EiopaCurve {
    /// Full published spot curve
    pub term_structure: TermStructure,
    /// Ultimate forward rate as a decimal
    pub ufr: f64,
    /// Liquid maturities used by EIOPA in its own calibration
    pub liquid_maturities: Vec<f64>,
    /// Scalar parameters (UFR in percent, LLP, alpha, ...) by row label
    pub parameters: BTreeMap<String, f64>,
}

fn column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| AlmError::Parse(format!("column {} not found", name)))
}

fn optional_number(record: &StringRecord, idx: usize) -> Result<Option<f64>> {
    match record.get(idx).map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_number("EIOPA value", value).map(Some),
    }
}

/// Read the EIOPA parameter and spot curve files for `country`.
///
/// The parameter file is indexed by its first column and carries
/// `<country>_Maturities` and `<country>_Values` columns; its first six rows
/// hold scalar parameters, including `UFR` in percent. The curve file has
/// the maturity in its first column and one yield column per country.
pub fn load_eiopa_curve_from_readers<P: Read, C: Read>(param: P, curves: C, country: &str) -> Result<EiopaCurve> {
    let mut param_reader = ReaderBuilder::new().trim(Trim::All).from_reader(param);
    let headers = param_reader.headers()?.clone();
    let maturity_col = column(&headers, &format!("{}_Maturities", country))?;
    let value_col = column(&headers, &format!("{}_Values", country))?;

    let mut parameters = BTreeMap::new();
    let mut liquid_maturities = Vec::new();
    for (row, record) in param_reader.records().enumerate() {
        let record = record?;
        if row < EIOPA_SCALAR_ROWS {
            if let (Some(label), Some(value)) = (record.get(0), optional_number(&record, value_col)?) {
                parameters.insert(label.to_string(), value);
            }
        } else if let Some(maturity) = optional_number(&record, maturity_col)? {
            liquid_maturities.push(maturity);
        }
    }
    let ufr = parameters
        .get("UFR")
        .map(|percent| percent / 100.0)
        .ok_or_else(|| AlmError::Parse(format!("UFR missing for {}", country)))?;

    let mut curve_reader = ReaderBuilder::new().trim(Trim::All).from_reader(curves);
    let yield_col = column(curve_reader.headers()?, country)?;
    let mut pairs = Vec::new();
    for record in curve_reader.records() {
        let record = record?;
        if let (Some(maturity), Some(rate)) = (optional_number(&record, 0)?, optional_number(&record, yield_col)?) {
            pairs.push((maturity, rate));
        }
    }

    Ok(EiopaCurve {
        term_structure: TermStructure::from_pairs(pairs)?,
        ufr,
        liquid_maturities,
        parameters,
    })
}

pub fn load_eiopa_curve<P: AsRef<Path>, Q: AsRef<Path>>(param_file: P, curves_file: Q, country: &str) -> Result<EiopaCurve> {
    load_eiopa_curve_from_readers(
        std::fs::File::open(param_file)?,
        std::fs::File::open(curves_file)?,
        country,
    )
}
