//! Validation of raw samples against the types database.

use crate::catalog::TypeCatalog;
use crate::core::{FlushdError, NormalizedRecord, RawSample, Result};

/// Validate `sample` against `catalog` and build the record to forward.
///
/// Each value is paired positionally with the data source declared at the
/// same index. Unknown types and arity mismatches are rejected; the caller
/// decides how to report them.
pub fn normalize(sample: &RawSample, catalog: &TypeCatalog) -> Result<NormalizedRecord> {
    let definition = catalog
        .lookup(&sample.type_name)
        .ok_or_else(|| FlushdError::UnknownType {
            type_name: sample.type_name.clone(),
        })?;

    if definition.arity() != sample.values.len() {
        return Err(FlushdError::ArityMismatch {
            type_name: sample.type_name.clone(),
            expected: definition.arity(),
            actual: sample.values.len(),
        });
    }

    Ok(NormalizedRecord {
        values: sample.values.clone(),
        dsnames: definition.dsnames(),
        dstypes: definition.dstypes(),
        time: sample.time,
        interval: sample.interval,
        host: sample.host.clone(),
        plugin: sample.plugin.clone(),
        plugin_instance: sample.plugin_instance.clone().unwrap_or_default(),
        type_name: sample.type_name.clone(),
        type_instance: sample.type_instance.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{counter, gauge};
    use pretty_assertions::assert_eq;

    fn catalog() -> TypeCatalog {
        TypeCatalog::parse(
            "cpu value:GAUGE:0:100\n\
             load shortterm:GAUGE:0:5000, midterm:GAUGE:0:5000, longterm:GAUGE:0:5000\n\
             if_octets rx:DERIVE:0:U, tx:COUNTER:0:U\n",
        )
    }

    #[test]
    fn test_normalize_single_value() {
        let sample = RawSample::new("cpu", vec![42.5])
            .at(1_700_000_000.0, 10.0)
            .host("web-1")
            .plugin("cpu", Some("0"))
            .type_instance("user");

        let record = normalize(&sample, &catalog()).unwrap();
        assert_eq!(
            record,
            NormalizedRecord {
                values: vec![gauge(42.5)],
                dsnames: vec!["value".to_string()],
                dstypes: vec!["GAUGE".to_string()],
                time: 1_700_000_000.0,
                interval: 10.0,
                host: "web-1".to_string(),
                plugin: "cpu".to_string(),
                plugin_instance: "0".to_string(),
                type_name: "cpu".to_string(),
                type_instance: "user".to_string(),
            }
        );
    }

    #[test]
    fn test_values_paired_by_position() {
        let sample = RawSample::with_values("if_octets", vec![counter(100), None]);
        let record = normalize(&sample, &catalog()).unwrap();

        assert_eq!(record.values, vec![counter(100), None]);
        assert_eq!(record.dsnames, vec!["rx", "tx"]);
        assert_eq!(record.dstypes, vec!["DERIVE", "COUNTER"]);
        assert_eq!(record.plugin_instance, "");
        assert_eq!(record.type_instance, "");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let sample = RawSample::new("unknown_type", vec![1.0]);
        let err = normalize(&sample, &catalog()).unwrap_err();
        assert!(matches!(err, FlushdError::UnknownType { ref type_name } if type_name == "unknown_type"));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let sample = RawSample::new("load", vec![0.5]);
        let err = normalize(&sample, &catalog()).unwrap_err();
        match err {
            FlushdError::ArityMismatch {
                type_name,
                expected,
                actual,
            } => {
                assert_eq!(type_name, "load");
                assert_eq!(expected, 3);
                assert_eq!(actual, 1);
            },
            other => panic!("unexpected error {:?}", other),
        }
    }
}
