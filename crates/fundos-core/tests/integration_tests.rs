//! Integration tests for the raw table to aggregated output flow.
//!
//! Builds tables shaped like the CVM holdings feed, resolves them through
//! the feed's column mapping and checks the aggregated result.

use fundos_core::prelude::*;
use fundos_core::{OutputField, OutputValue};

// =============================================================================
// FIXTURES
// =============================================================================

const HEADER: [&str; 6] = [
    "TP_FUNDO",
    "CNPJ_FUNDO",
    "DENOM_SOCIAL",
    "DT_COMPTC",
    "TP_APLIC",
    "VL_MERC_POS_FINAL",
];

fn cvm_table(rows: &[[&str; 6]]) -> HoldingTable {
    let mut table = HoldingTable::new(HEADER.iter().map(|c| c.to_string()).collect());
    for row in rows {
        table
            .push_row(row.iter().map(|c| Some(c.to_string())).collect())
            .unwrap();
    }
    table
}

fn sample_month() -> HoldingTable {
    cvm_table(&[
        ["FI", "11.111.111/0001-11", "ALFA FI", "2023-06-30", "Titulos Publicos", "750000.00"],
        ["FI", "11.111.111/0001-11", "ALFA FI", "2023-06-30", "Acoes", "150000.00"],
        ["FI", "11.111.111/0001-11", "ALFA FI", "2023-06-30", "Titulos Publicos", "100000.00"],
        ["FI", "22.222.222/0001-22", "", "2023-06-30", "Debentures", "4.2E5"],
    ])
}

// =============================================================================
// CVM FEED
// =============================================================================

#[test]
fn test_cvm_table_end_to_end() {
    let config = TransformConfig::cvm_default();
    let records = sample_month().records(&config).unwrap();
    let output = aggregate(&records, &config).unwrap();

    assert_eq!(output.len(), 3);

    assert_eq!(output[0].fund_id, "11.111.111/0001-11");
    assert_eq!(output[0].asset_type.as_deref(), Some("Acoes"));
    assert!((output[0].percentage_of_fund - 0.15).abs() < 1e-12);

    assert_eq!(output[1].asset_type.as_deref(), Some("Titulos Publicos"));
    assert!((output[1].percentage_of_fund - 0.85).abs() < 1e-12);

    assert_eq!(output[2].fund_id, "22.222.222/0001-22");
    assert_eq!(output[2].percentage_of_fund, 1.0);
}

#[test]
fn test_cvm_output_layout_uses_feed_names() {
    let columns = TransformConfig::cvm_default().output_columns().unwrap();
    assert_eq!(
        columns.names(),
        vec!["CNPJ_FUNDO", "TP_APLIC", "PERCENTUAL_ATIVO"]
    );

    let record = AggregatedRecord::new("F1", Some("Acoes".into()), 0.5);
    let cells: Vec<OutputValue<'_>> = columns.iter().map(|(_, f)| record.value(f)).collect();
    assert_eq!(
        cells,
        vec![
            OutputValue::Text(Some("F1")),
            OutputValue::Text(Some("Acoes")),
            OutputValue::Number(0.5),
        ]
    );
}

#[test]
fn test_extra_columns_become_attributes() {
    let records = sample_month()
        .records(&TransformConfig::cvm_default())
        .unwrap();

    assert_eq!(records[0].attributes["TP_FUNDO"], "FI");
    assert_eq!(records[0].attributes["DT_COMPTC"], "2023-06-30");
    // Empty cells are absent, not empty strings
    assert_eq!(records[3].social_name, None);
}

#[test]
fn test_members_with_different_headers() {
    let mut first = sample_month();

    let mut second = HoldingTable::new(vec![
        "CNPJ_FUNDO".into(),
        "TP_APLIC".into(),
        "VL_MERC_POS_FINAL".into(),
        "DENOM_SOCIAL".into(),
        "CD_ATIVO".into(),
    ]);
    second
        .push_row(vec![
            Some("22.222.222/0001-22".into()),
            Some("Cotas de Fundos".into()),
            Some("420000".into()),
            None,
            Some("XYZ11".into()),
        ])
        .unwrap();

    first.append(second);
    assert_eq!(first.columns().len(), 7);
    assert_eq!(first.len(), 5);

    let config = TransformConfig::cvm_default();
    let output = aggregate(&first.records(&config).unwrap(), &config).unwrap();

    let fund_b: Vec<_> = output
        .iter()
        .filter(|r| r.fund_id == "22.222.222/0001-22")
        .collect();
    assert_eq!(fund_b.len(), 2);
    for r in fund_b {
        assert!((r.percentage_of_fund - 0.5).abs() < 1e-12);
    }
}

#[test]
fn test_grouping_by_social_name_keeps_placeholder() {
    let mut config = TransformConfig::cvm_default();
    config.retained_columns.insert(2, "DENOM_SOCIAL".into());
    config.group_keys.push("DENOM_SOCIAL".into());

    let columns = config.output_columns().unwrap();
    assert_eq!(
        columns.names(),
        vec!["CNPJ_FUNDO", "TP_APLIC", "DENOM_SOCIAL", "PERCENTUAL_ATIVO"]
    );

    let records = sample_month().records(&config).unwrap();
    let output = aggregate(&records, &config).unwrap();

    assert_eq!(output.len(), 3);
    assert_eq!(output[0].social_name.as_deref(), Some("ALFA FI"));
    assert_eq!(output[2].fund_id, "22.222.222/0001-22");
    assert_eq!(output[2].social_name.as_deref(), Some(MISSING_SOCIAL_NAME));
    assert_eq!(
        output[2].value(OutputField::SocialName),
        OutputValue::Text(Some("Sem denominacao social NaN"))
    );
    assert_eq!(output[2].percentage_of_fund, 1.0);
}

// =============================================================================
// FAILURES
// =============================================================================

#[test]
fn test_unknown_column_fails_before_rows() {
    let table = HoldingTable::new(vec!["CNPJ_FUNDO".into(), "VL_MERC_POS_FINAL".into()]);
    let err = table.records(&TransformConfig::cvm_default()).unwrap_err();

    assert!(err.is_configuration());
    let message = err.to_string();
    assert!(message.contains("DENOM_SOCIAL"));
    assert!(message.contains("TP_APLIC"));
}

#[test]
fn test_unparseable_value_reports_row() {
    let table = cvm_table(&[
        ["FI", "F1", "ALFA", "2023-06-30", "Acoes", "10"],
        ["FI", "F1", "ALFA", "2023-06-30", "Acoes", "1.234,56"],
    ]);

    let err = table.records(&TransformConfig::cvm_default()).unwrap_err();
    assert_eq!(
        err,
        FundosError::data_integrity(
            Some("F1"),
            Some(1),
            "'1.234,56' is not a decimal in column 'VL_MERC_POS_FINAL'"
        )
    );
}

#[test]
fn test_missing_fund_id_in_feed() {
    let table = cvm_table(&[
        ["FI", "F1", "ALFA", "2023-06-30", "Acoes", "10"],
        ["FI", "", "ALFA", "2023-06-30", "Acoes", "10"],
    ]);
    let config = TransformConfig::cvm_default();

    let records = table.records(&config).unwrap();
    let err = aggregate(&records, &config).unwrap_err();

    assert!(err.is_data_integrity());
    assert!(err.to_string().contains("at row 1"));
}

#[test]
fn test_zero_total_fund_in_feed() {
    let table = cvm_table(&[
        ["FI", "F1", "ALFA", "2023-06-30", "Acoes", "10"],
        ["FI", "F2", "BETA", "2023-06-30", "Acoes", "0"],
    ]);
    let config = TransformConfig::cvm_default();
    let records = table.records(&config).unwrap();

    let err = aggregate(&records, &config).unwrap_err();
    assert!(err.to_string().contains("for fund 'F2'"));

    let config = config.with_zero_total_policy(ZeroTotalPolicy::Propagate);
    let output = aggregate(&records, &config).unwrap();
    assert_eq!(output[0].percentage_of_fund, 1.0);
    assert!(output[1].percentage_of_fund.is_nan());
}

#[test]
fn test_output_field_order_is_configurable() {
    let mut config = TransformConfig::cvm_default();
    config.group_keys = vec!["TP_APLIC".into(), "CNPJ_FUNDO".into()];

    let columns = config.output_columns().unwrap();
    let fields: Vec<OutputField> = columns.iter().map(|(_, f)| f).collect();
    assert_eq!(
        fields,
        vec![
            OutputField::AssetType,
            OutputField::FundId,
            OutputField::Percentage
        ]
    );
}
