/*!
 * Catalog translation end to end with a simulated engine
 */

use std::path::Path;
use std::sync::Arc;

use rstlate::app_controller::Controller;
use rstlate::catalog::PoCatalog;
use rstlate::database::{DatabaseConnection, Repository};
use rstlate::providers::mock::MockEngine;
use rstlate::providers::EngineRequest;
use rstlate::{Config, TranslationService};

use crate::common;

const CIRCULATION_RST: &str = "Circulation
===========

Check out items at the desk.

See :ref:`holds <holds-label>` for
reservations.

.. _holds-label:

Use |koha| daily.
";

const CHECKOUT: &str = "Check out items at the desk.";
const HOLDS: &str = "See :ref:`holds <holds-label>` for reservations.";
const KOHA: &str = "Use |koha| daily.";

fn swedish(request: &EngineRequest) -> String {
    request
        .text
        .replace(CHECKOUT, "Låna ut exemplar vid disken.")
        .replace("See", "Se")
        .replace("holds ", "reservationer ")
        .replace("for reservations.", "för reservationer.")
}

/// Keeps the display text but drops every cross-reference token
fn drops_references(request: &EngineRequest) -> String {
    if request.text.contains("XREF") {
        "Se reservationer för reservationer.".to_string()
    } else {
        request.text.clone()
    }
}

fn write_layout(root: &Path) -> std::path::PathBuf {
    common::create_test_file(&root.join("source"), "acquisitions.rst", "Ordering\n\nPlace an order.\n").unwrap();
    common::create_manual_layout(
        root,
        "circulation",
        CIRCULATION_RST,
        &[(CHECKOUT, ""), (HOLDS, ""), (KOHA, "Använd |koha| dagligen.")],
    )
    .unwrap()
}

fn controller(config: Config, engine: Arc<MockEngine>, cache: Option<Repository>) -> Controller {
    let mut service = TranslationService::from_config(&config, engine).unwrap();
    if let Some(repository) = cache {
        service = service.with_store(Arc::new(repository));
    }
    Controller::with_config(config).with_service(service).with_progress(false)
}

#[tokio::test]
async fn test_translateCatalogs_withWorkingEngine_shouldCompleteStatus() {
    common::init_logging();
    let root = common::create_temp_dir().unwrap();
    let po_path = write_layout(root.path());
    let config = common::test_config(root.path());

    let before = Controller::with_config(config.clone()).status(Some("circulation")).unwrap();
    assert_eq!((before.translated(), before.total()), (1, 3));
    assert!(before.files[0].missing.is_empty());

    let engine = Arc::new(MockEngine::working().with_custom_response(swedish));
    let controller = controller(config, engine.clone(), None);
    let files = controller.catalog_files(None).unwrap();
    let summary = controller
        .translate_catalogs_until(&files, false, std::future::pending())
        .await
        .unwrap();

    assert_eq!((summary.files, summary.translated, summary.skipped, summary.failed), (1, 2, 1, 0));
    assert!(summary.unrestored_units.is_empty());
    assert_eq!(engine.request_count(), 2);

    let catalog = PoCatalog::open(&po_path).unwrap();
    assert_eq!(catalog.translation(CHECKOUT).as_deref(), Some("Låna ut exemplar vid disken."));
    assert_eq!(
        catalog.translation(HOLDS).as_deref(),
        Some("Se :ref:`reservationer <holds-label>` för reservationer.")
    );
    assert_eq!(catalog.translation(KOHA).as_deref(), Some("Använd |koha| dagligen."));

    let after = controller.status(None).unwrap();
    assert_eq!(after.files.len(), 2);
    assert!(!after.files[0].has_catalog);
    assert_eq!(after.files[0].name, "acquisitions");
    assert_eq!(after.files[1].percentage(), 100.0);
    assert_eq!(after.missing_catalogs().count(), 1);
}

#[tokio::test]
async fn test_translateCatalogs_withLostReference_shouldMarkFuzzyAndReport() {
    common::init_logging();
    let root = common::create_temp_dir().unwrap();
    let po_path = write_layout(root.path());

    let engine = Arc::new(MockEngine::working().with_custom_response(drops_references));
    let controller = controller(common::test_config(root.path()), engine, None);
    let files = controller.catalog_files(Some("circulation")).unwrap();
    let summary = controller
        .translate_catalogs_until(&files, false, std::future::pending())
        .await
        .unwrap();

    assert_eq!(summary.translated, 2);
    assert_eq!(summary.unrestored_units, vec![HOLDS.to_string()]);

    let catalog = PoCatalog::open(&po_path).unwrap();
    assert_eq!(catalog.stats().fuzzy, 1);
    assert_eq!(catalog.translation(HOLDS).as_deref(), Some("Se reservationer för reservationer."));

    let removed = controller.remove_fuzzy(&files).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(PoCatalog::open(&po_path).unwrap().stats().fuzzy, 0);
}

#[tokio::test]
async fn test_translateCatalogs_withCache_shouldSkipEngineOnSecondRun() {
    let root = common::create_temp_dir().unwrap();
    let po_path = write_layout(root.path());
    let config = common::test_config(root.path());
    let cache_path = config.cache.path.clone().unwrap();

    let first_engine = Arc::new(MockEngine::working().with_custom_response(swedish));
    let first = controller(
        config.clone(),
        first_engine.clone(),
        Some(Repository::new(DatabaseConnection::new(&cache_path).unwrap())),
    );
    let files = first.catalog_files(None).unwrap();
    first
        .translate_catalogs_until(&files, false, std::future::pending())
        .await
        .unwrap();
    assert_eq!(first_engine.request_count(), 2);

    // Start over from the untranslated catalog
    write_layout(root.path());
    let second_engine = Arc::new(MockEngine::failing());
    let second = controller(
        config,
        second_engine.clone(),
        Some(Repository::new(DatabaseConnection::new(&cache_path).unwrap())),
    );
    let summary = second
        .translate_catalogs_until(&files, false, std::future::pending())
        .await
        .unwrap();

    assert_eq!((summary.translated, summary.from_cache, summary.failed), (2, 2, 0));
    assert_eq!(second_engine.request_count(), 0);
    assert_eq!(
        PoCatalog::open(&po_path).unwrap().translation(HOLDS).as_deref(),
        Some("Se :ref:`reservationer <holds-label>` för reservationer.")
    );
}

#[tokio::test]
async fn test_translateCatalogs_withTranslateAll_shouldRetranslateEverything() {
    let root = common::create_temp_dir().unwrap();
    let po_path = write_layout(root.path());

    let engine = Arc::new(MockEngine::working().with_custom_response(swedish));
    let controller = controller(common::test_config(root.path()), engine.clone(), None);
    let files = controller.catalog_files(None).unwrap();
    let summary = controller
        .translate_catalogs_until(&files, true, std::future::pending())
        .await
        .unwrap();

    assert_eq!((summary.translated, summary.skipped), (3, 0));
    assert_eq!(engine.request_count(), 3);
    // The engine echoes the substitution line, so the stored translation is replaced
    assert_eq!(PoCatalog::open(&po_path).unwrap().translation(KOHA).as_deref(), Some(KOHA));
}

#[test]
fn test_fixReferences_withCorruptedCatalog_shouldRepairOnlyWhenNotDryRun() {
    let root = common::create_temp_dir().unwrap();
    let corrupted = "Se :ref:`catalog concerns <catalog-concerns-label>`ns för mer.";
    let po_path = common::create_manual_layout(
        root.path(),
        "cataloging",
        "See :ref:`catalog concerns <catalog-concerns-label>` for more.\n",
        &[
            ("See :ref:`catalog concerns <catalog-concerns-label>` for more.", corrupted),
            ("Plain", "Enkel"),
        ],
    )
    .unwrap();

    let controller = Controller::with_config(common::test_config(root.path()));
    let files = controller.catalog_files(None).unwrap();

    let preview = controller.fix_references(&files, true).unwrap();
    assert_eq!((preview.files, preview.changed_files, preview.fixes.len()), (1, 1, 1));
    assert_eq!(preview.fixes[0].rules, vec!["orphan-suffix".to_string()]);
    assert!(std::fs::read_to_string(&po_path).unwrap().contains(corrupted));

    let applied = controller.fix_references(&files, false).unwrap();
    assert_eq!(applied.changed_files, 1);
    assert_eq!(
        PoCatalog::open(&po_path)
            .unwrap()
            .translation("See :ref:`catalog concerns <catalog-concerns-label>` for more.")
            .as_deref(),
        Some("Se :ref:`catalog concerns <catalog-concerns-label>` för mer.")
    );

    assert!(controller.fix_references(&files, false).unwrap().fixes.is_empty());
}

#[test]
fn test_status_withPoMissingParagraph_shouldListIt() {
    let root = common::create_temp_dir().unwrap();
    common::create_manual_layout(
        root.path(),
        "circulation",
        CIRCULATION_RST,
        &[(CHECKOUT, "Låna ut exemplar vid disken.")],
    )
    .unwrap();

    let report = Controller::with_config(common::test_config(root.path()))
        .status(Some("circulation"))
        .unwrap();

    let file = &report.files[0];
    assert_eq!((file.translated, file.total), (1, 1));
    assert_eq!(file.missing, vec![HOLDS.to_string(), KOHA.to_string()]);
    assert!(report.to_string().contains("Overall completion: 100.0%"));
}

#[test]
fn test_catalogFiles_withUnknownLanguage_shouldFail() {
    let root = common::create_temp_dir().unwrap();
    write_layout(root.path());

    let mut config = common::test_config(root.path());
    config.target_language = "de".to_string();
    assert!(Controller::with_config(config).catalog_files(None).is_err());
}
