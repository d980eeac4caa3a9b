/*!
 * Properties of the markup protection pipeline over a sample corpus
 */

use std::collections::HashSet;

use rstlate::markup::classifier::{classify, ensure_disjoint};
use rstlate::markup::{decode, encode, MarkupCodec, Repairer, Restoration};

use crate::common::SAMPLE_UNITS;

#[test]
fn test_roundTrip_withSampleUnits_shouldReproduceSource() {
    let codec = MarkupCodec::default();
    for unit in SAMPLE_UNITS {
        assert_eq!(&codec.round_trip(unit).unwrap(), unit);
    }
}

#[test]
fn test_encode_withSampleUnits_shouldProduceDistinctTokens() {
    for unit in SAMPLE_UNITS {
        let fragments = classify(unit).unwrap();
        let encoded = encode(unit, &fragments);

        let tokens: HashSet<&str> = encoded.table.iter().map(|p| p.token.as_str()).collect();
        assert_eq!(tokens.len(), encoded.table.len(), "duplicate token in {:?}", unit);
        for token in &tokens {
            assert_eq!(encoded.text.matches(token).count(), 1, "{} not unique in {:?}", token, encoded.text);
        }
    }
}

#[test]
fn test_encode_withTokenLookalikeInSource_shouldSaltTokens() {
    let unit = "Literal {{XREF_0}} next to :ref:`holds <holds-label>`.";
    let codec = MarkupCodec::default();

    let encoded = codec.protect(unit).unwrap();
    assert_ne!(encoded.table.salt(), 0);
    assert_eq!(encoded.text.matches("{{XREF_0}}").count(), 1);
    assert_eq!(codec.round_trip(unit).unwrap(), unit);
}

#[test]
fn test_restore_withTokenShapedLiterals_shouldKeepThemUntranslated() {
    let codec = MarkupCodec::default();
    let units = [
        "Literal {{XREF_0}} and :ref:`A <a>`",
        "Literal {XREF_0} and :ref:`A <a>`",
        "Literal {{ XREF_0 }} and :ref:`A <a>`",
        "Template {{LINK_1}} beside `Manual <http://example.org/>`__",
    ];

    for unit in units {
        assert_eq!(codec.round_trip(unit).unwrap(), unit);

        let encoded = codec.protect(unit).unwrap();
        let untranslated = encoded.text.clone();
        let restored = codec.restore(&untranslated, encoded.table);
        assert_eq!(restored.text, unit);
        assert!(restored.is_clean(), "unclean restore for {:?}", unit);
    }
}

#[test]
fn test_classify_withSampleUnits_shouldReturnDisjointSortedFragments() {
    for unit in SAMPLE_UNITS {
        let fragments = classify(unit).unwrap();
        assert!(ensure_disjoint(unit, &fragments).is_ok());
        assert!(fragments.windows(2).all(|w| w[0].span.end <= w[1].span.start));
    }
}

#[test]
fn test_classify_withSampleUnits_shouldFindEveryConstruct() {
    let counts: Vec<usize> = SAMPLE_UNITS.iter().map(|u| classify(u).unwrap().len()).collect();
    assert_eq!(counts, vec![0, 1, 1, 2, 1, 2, 1, 3, 1]);
}

#[test]
fn test_repair_withSampleOutputs_shouldBeIdempotent() {
    let repairer = Repairer::new();
    let outputs = [
        "Se :ref:`exemplarsökning <item-searching-label>`ns.",
        ":ref:`A <a-label>`, :ref:`B <b-label>`",
        ":ref:`x <y>` :ref:`x <y>` {{SUBST_3}}",
        "`Handboken <https://koha-community.org/manual/>`__idag",
        ":ref:`holds <holds-label>`-label>` och :ref:`renew <renew-label`",
        ":ref:`t <l>`t <l>`t <l>`t <l>`t <l>`t <l>`t <l>`t <l>`t <l>`",
        ":ref:`holds <holds-label>` <holds-label>` <holds-label>` <holds-label>` <holds-label>` idag",
        "Mall {{XREF_0}} och {XLBL_2} kvar",
    ];

    for output in outputs.iter().copied().chain(SAMPLE_UNITS.iter().copied()) {
        let once = repairer.repair(output).text;
        assert_eq!(repairer.repair(&once).text, once, "not idempotent for {:?}", output);
    }
}

#[test]
fn test_restore_withDisplayTextAbsent_shouldEmitValidMarkup() {
    let codec = MarkupCodec::default();
    for unit in SAMPLE_UNITS {
        let encoded = codec.protect(unit).unwrap();
        let tokens_only: String = encoded
            .table
            .iter()
            .map(|p| p.token.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        let restored = codec.restore(&tokens_only, encoded.table);
        assert!(restored.unrestored.is_empty(), "lost fragment for {:?}", unit);
        assert!(restored.residual.is_empty(), "residual {:?} for {:?}", restored.residual, unit);
    }
}

/// Display text dropped and the label left bare
#[test]
fn test_decode_withDisplayTextDroppedAndLabelBare_shouldFallBackToOriginal() {
    let source = "See :ref:`item search <item-searching-label>`.";
    let encoded = encode(source, &classify(source).unwrap());

    let decoded = decode(":ref:`<item-searching-label>`.", encoded.table);
    assert_eq!(decoded.text, ":ref:`item search<item-searching-label>`.");
    assert_ne!(decoded.outcomes[0].restoration, Restoration::Lost);
}

/// Only the hyperlink token survives
#[test]
fn test_decode_withOnlyHyperlinkToken_shouldRestoreUrl() {
    let source = "See the `Manual <http://example.org/>`__.";
    let encoded = encode(source, &classify(source).unwrap());
    let token = encoded.table.iter().next().unwrap().token.to_string();

    let decoded = decode(&format!("Se {}.", token), encoded.table);
    assert_eq!(decoded.text, "Se `Manual <http://example.org/>`__.");
}

/// Intact neighbours closer than the scan gap stay separate
#[test]
fn test_restore_withCloseIntactReferences_shouldNotMerge() {
    let codec = MarkupCodec::default();
    let source = "See :ref:`A <a-label>` or :ref:`B <b-label>`.";
    let encoded = codec.protect(source).unwrap();

    let restored = codec.restore("Se :ref:`A {{XREF_0}}` el :ref:`B {{XREF_1}}`.", encoded.table);
    assert_eq!(restored.text, "Se :ref:`A <a-label>` el :ref:`B <b-label>`.");
    assert!(restored.repairs.is_empty());
}

/// Leftover display text glued after the reference
#[test]
fn test_restore_withDisplayLeftoverAfterReference_shouldStripIt() {
    let codec = MarkupCodec::default();
    let source = "Use the :ref:`notices and slips tool <notices-and-slips-label>`.";
    let encoded = codec.protect(source).unwrap();

    let restored = codec.restore(
        "Använd :ref:`notices and slips tool {{XREF_0}}`tool.",
        encoded.table,
    );
    assert_eq!(restored.text, "Använd :ref:`notices and slips tool <notices-and-slips-label>`.");
    assert!(restored.is_clean());
}

#[test]
fn test_restore_withoutFragments_shouldPassTranslationThrough() {
    let codec = MarkupCodec::default();
    let encoded = codec.protect("Plain sentence without markup.").unwrap();
    assert!(encoded.table.is_empty());

    let restored = codec.restore("Vanlig mening utan markering.", encoded.table);
    assert_eq!(restored.text, "Vanlig mening utan markering.");
    assert!(restored.is_clean());
}
