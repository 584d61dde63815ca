use super::*;
use playbill_watcher::config::ScraperConfig;
use playbill_watcher::search::{SearchClient, Searcher};
use playbill_watcher::SearchOutcome;

const PLAYBILL_HTML: &str = r#"
    <html><body>
        <input name="tags"><button id="reload">Найти</button>
        <table id="playbill"><tbody>
            <tr><td>10.11.2025 19:00</td><td>На чёрной лестнице</td></tr>
            <tr><td>уточняется</td><td>На чёрной лестнице</td></tr>
            <tr><td>20.11.2025 19:00</td><td>На чёрной лестнице</td></tr>
        </tbody></table>
    </body></html>
"#;

fn client_for(factory: &ScriptedFactory) -> SearchClient {
    let session_factory: Arc<dyn SessionFactory> = Arc::new(factory.clone());
    SearchClient::new(session_factory, factory.site.clone(), &ScraperConfig::default())
}

#[tokio::test]
async fn test_search_returns_rows_in_page_order() {
    let factory = ScriptedFactory::new(Script {
        html: PLAYBILL_HTML.to_string(),
        ..Script::default()
    });

    let outcome = client_for(&factory).search("На чёрной").await;

    let SearchOutcome::Rows(found) = outcome else {
        panic!("expected rows, got {:?}", outcome);
    };
    assert_eq!(found.len(), 3);
    assert_eq!(found[0].date, Some(date(2025, 11, 10)));
    assert_eq!(found[1].date, None);
    assert_eq!(found[1].date_text, "уточняется");
    assert_eq!(found[2].date, Some(date(2025, 11, 20)));
}

#[tokio::test]
async fn test_search_drives_the_form_with_tiered_waits() {
    let factory = ScriptedFactory::new(Script {
        html: PLAYBILL_HTML.to_string(),
        ..Script::default()
    });

    client_for(&factory).search("На чёрной").await;

    assert_eq!(
        factory.journal(),
        vec![
            "open".to_string(),
            format!("navigate:{}", SITE_URL),
            r#"wait:input[name="tags"]:20"#.to_string(),
            r#"type:input[name="tags"]:На чёрной"#.to_string(),
            "click:#reload".to_string(),
            "wait:#playbill tbody tr:10".to_string(),
            "content".to_string(),
            "close".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_rows_never_appearing_means_zero_results() {
    let factory = ScriptedFactory::new(Script {
        rows_appear: false,
        ..Script::default()
    });

    let outcome = client_for(&factory).search("Ревизор").await;

    assert_eq!(outcome, SearchOutcome::Rows(Vec::new()));
    assert_eq!(factory.count("content"), 0);
    assert_eq!(factory.count("close"), 1);
}

#[tokio::test]
async fn test_missing_search_input_is_unavailable() {
    let factory = ScriptedFactory::new(Script {
        input_appears: false,
        ..Script::default()
    });

    let outcome = client_for(&factory).search("Ревизор").await;

    match outcome {
        SearchOutcome::Unavailable(reason) => {
            assert!(reason.contains("did not appear within 20s"), "{}", reason);
        }
        other => panic!("expected unavailable, got {:?}", other),
    }
    assert_eq!(factory.count("type"), 0);
    assert_eq!(factory.count("close"), 1);
}

#[tokio::test]
async fn test_browser_failure_while_waiting_for_rows_is_unavailable() {
    let factory = ScriptedFactory::new(Script {
        fail_results_wait: true,
        ..Script::default()
    });

    let outcome = client_for(&factory).search("Ревизор").await;

    assert!(matches!(outcome, SearchOutcome::Unavailable(ref reason) if reason.contains("target crashed")));
    assert_eq!(factory.count("close"), 1);
}

#[tokio::test]
async fn test_navigation_failure_releases_session() {
    let factory = ScriptedFactory::new(Script {
        fail_navigate: true,
        ..Script::default()
    });

    let outcome = client_for(&factory).search("Ревизор").await;

    assert!(matches!(outcome, SearchOutcome::Unavailable(_)));
    assert_eq!(factory.count("open"), 1);
    assert_eq!(factory.count("close"), 1);
}

#[tokio::test]
async fn test_browser_launch_failure_is_unavailable() {
    let factory = ScriptedFactory::new(Script {
        fail_open: true,
        ..Script::default()
    });

    let outcome = client_for(&factory).search("Ревизор").await;

    assert!(matches!(outcome, SearchOutcome::Unavailable(ref reason) if reason.contains("no chrome")));
    assert!(factory.journal().is_empty());
}

#[tokio::test]
async fn test_each_search_gets_a_fresh_session() {
    let factory = ScriptedFactory::new(Script {
        html: PLAYBILL_HTML.to_string(),
        ..Script::default()
    });
    let client = client_for(&factory);

    client.search("Записки юного врача").await;
    client.search("На чёрной").await;

    let journal = factory.journal();
    assert_eq!(factory.count("open"), 2);
    assert_eq!(factory.count("close"), 2);
    // The first session is gone before the second opens.
    let first_close = journal.iter().position(|e| e == "close").unwrap();
    let second_open = journal.iter().rposition(|e| e == "open").unwrap();
    assert!(first_close < second_open);
}
