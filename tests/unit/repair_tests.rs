/*!
 * Repair pass against corruption recorded from real engine output
 */

use rstlate::markup::{MarkupCodec, Normalization, Repairer};

fn repair(text: &str) -> String {
    Repairer::new().repair(text).text
}

#[test]
fn test_repair_withRepeatedLabelTail_shouldStripTail() {
    assert_eq!(
        repair(":ref:`TICKET\\_RESOLUTION auktoriserat värde <ticketresolution-av-category-label>`-av-category-label>` i"),
        ":ref:`TICKET\\_RESOLUTION auktoriserat värde <ticketresolution-av-category-label>` i"
    );
}

#[test]
fn test_repair_withRolePrefixResidue_shouldReportRule() {
    let report = Repairer::new().repair("Se a:ref:`catalog concerns <manage-catalog-concerns-label>`.");

    assert_eq!(report.text, "Se :ref:`catalog concerns <manage-catalog-concerns-label>`.");
    assert_eq!(report.applied, vec!["stray-role-prefix".to_string()]);
    assert!(report.residual.is_empty());
}

#[test]
fn test_repair_withTempPrefixMidSentence_shouldDropPrefix() {
    assert_eq!(
        repair("Använd temp:ref:`notices and slips tool <notices-and-slips-label>` för mallar."),
        "Använd :ref:`notices and slips tool <notices-and-slips-label>` för mallar."
    );
}

#[test]
fn test_repair_withSeveralSignatures_shouldFixAllInOnePass() {
    let report = Repairer::new().repair(
        "Se :ref:`catalog concerns <catalog-concerns-label>`ns och :ref:`text<label` samt :ref:`t <l>`t <l>`.",
    );

    assert_eq!(
        report.text,
        "Se :ref:`catalog concerns <catalog-concerns-label>` och :ref:`text<label>` samt :ref:`t <l>`."
    );
    for rule in ["orphan-suffix", "missing-target-bracket", "duplicated-target"] {
        assert!(report.applied.iter().any(|a| a == rule), "{} not applied", rule);
    }
}

#[test]
fn test_repair_withGluedWordAfterHyperlink_shouldInsertSpace() {
    assert_eq!(
        repair("Läs `Handboken <https://koha-community.org/manual/>`__idag."),
        "Läs `Handboken <https://koha-community.org/manual/>`__ idag."
    );
}

#[test]
fn test_repair_withRepeatedAnonymousHyperlink_shouldKeepOne() {
    assert_eq!(
        repair("`A <http://a>`_ `A <http://a>`_ och `B <http://b>`_"),
        "`A <http://a>`_ och `B <http://b>`_"
    );
}

#[test]
fn test_repair_withCorpusNormalizations_shouldRestoreTitles() {
    let repairer = Repairer::with_normalizations(vec![
        Normalization::new(
            "notices and <notices-and-slips-label>",
            "notices and slips <notices-and-slips-label>",
        ),
        Normalization::new("catalog <catalog-concerns-label>", "catalog concerns <catalog-concerns-label>"),
    ])
    .unwrap();

    let report = repairer.repair("Se :ref:`notices and <notices-and-slips-label>` och :ref:`catalog <catalog-concerns-label>`.");
    assert_eq!(
        report.text,
        "Se :ref:`notices and slips <notices-and-slips-label>` och :ref:`catalog concerns <catalog-concerns-label>`."
    );
    assert_eq!(report.applied.len(), 2);
    assert_eq!(repairer.repair(&report.text).text, report.text);
}

#[test]
fn test_repair_withNestedReference_shouldReportResidual() {
    let report = Repairer::new().repair("Se :ref:`öppen :ref:`x <y>`");

    assert_eq!(report.residual.len(), 1);
    assert!(report.residual[0].starts_with("reference opened inside another reference"));
}

#[test]
fn test_restore_withResidualCorruption_shouldNotBeClean() {
    let codec = MarkupCodec::default();
    let encoded = codec.protect("See :ref:`holds <holds-label>`.").unwrap();

    let restored = codec.restore("Se :ref:`öppen :ref:`reservationer {{XREF_0}}`.", encoded.table);
    assert!(!restored.residual.is_empty());
    assert!(!restored.is_clean());
}

#[test]
fn test_restore_withTargetLeftWithoutBacktick_shouldCountRepairAsRestored() {
    let codec = MarkupCodec::default();
    let encoded = codec.protect("See :ref:`holds <holds-label>` here.").unwrap();

    let restored = codec.restore("Se :ref:`reservationer <holds-label> här.", encoded.table);
    assert_eq!(restored.text, "Se :ref:`reservationer <holds-label>` här.");
    assert!(restored.unrestored.is_empty());
    assert!(restored.repairs.contains(&"missing-closing-backtick".to_string()));
}

#[test]
fn test_rules_shouldAllBeDescribed() {
    for rule in Repairer::rules() {
        assert!(!rule.description.is_empty(), "rule {} has no description", rule.name);
    }
}
