use ado_skin::generate::{generate, Collaborators};
use ado_skin::html::RegexHtml;
use ado_skin::load_config::load_config;
use ado_skin::skin::SkinDocument;
use ado_skin::snapshot::SnapshotStore;
use std::path::PathBuf;

fn demo(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(file)
}

async fn demo_document() -> SkinDocument {
    let config = load_config(demo("plan.yaml")).expect("demo config loads");
    let store = SnapshotStore::from_path(demo("snapshot.json")).expect("demo snapshot loads");
    let html = RegexHtml::new();
    let collaborators = Collaborators {
        plan: &store,
        queries: &store,
        history: &store,
        attachments: &store,
        rich_text: &html,
        html: &html,
    };
    generate(&config, &collaborators)
        .await
        .expect("demo generation succeeds")
}

#[tokio::test]
async fn demo_plan_flattens_and_assembles_test_cases() {
    let document = demo_document().await;
    assert_eq!(document.plan_id, 12);

    let ids: Vec<u64> = document.suites.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(document.suites[0].header.is_none());
    assert!(document.suites[1..].iter().all(|s| s.level == 1 && s.header.is_some()));

    let sign_in = &document.suites[1].test_cases[0];
    assert_eq!(sign_in.level, 2);
    assert_eq!(sign_in.description, "<p>Valid users reach the dashboard.</p>");
    assert_eq!(sign_in.steps.len(), 2);
    assert_eq!(sign_in.steps[0].cell("Attachments").unwrap().value, "form.png");
    assert_eq!(sign_in.step_attachments.len(), 1);
    let linked = sign_in.step_attachments[0].cell("Attachment").unwrap();
    assert_eq!(linked.value, "form.png");
    assert_eq!(linked.url.as_deref(), Some("http://files/form.png"));
    assert_eq!(sign_in.steps[0].cell("Action").unwrap().width.as_deref(), Some("26.9%"));
    assert!(sign_in.attachments.is_empty());
    assert_eq!(sign_in.documents.len(), 1);
    assert_eq!(sign_in.documents[0].heading, "Test case attachment: notes.docx");

    assert_eq!(sign_in.requirements.len(), 1);
    assert_eq!(
        sign_in.requirements[0].values(),
        vec!["1", "501", "C-17", "Users can sign in"]
    );
    assert_eq!(sign_in.linked_moms.len(), 1);
    assert_eq!(sign_in.linked_moms[0].cell("Type").unwrap().value, "Bug");

    assert_eq!(
        sign_in.history,
        vec![
            "2024-03-05 09:30:00 - Bob: Approved".to_owned(),
            "2024-03-01 08:00:00 - Ann: Created".to_owned(),
        ]
    );

    let pay = &document.suites[2].test_cases[0];
    assert_eq!(pay.steps[0].cell("Attachments").unwrap().value, "receipt.pdf");
    assert_eq!(pay.history, vec!["2024-04-02 12:00:00 - Carol: Imported".to_owned()]);
    assert!(pay.requirements.is_empty());

    let refs: Vec<&str> = document
        .attachment_refs
        .iter()
        .map(|a| a.file_name.as_str())
        .collect();
    assert_eq!(refs, vec!["form.png", "notes.docx", "receipt.pdf"]);
}

#[tokio::test]
async fn demo_traces_cover_every_adapter() {
    let document = demo_document().await;
    let traces = &document.traces;
    assert_eq!(traces.len(), 4);

    let live = &traces[0];
    assert_eq!(live.rows.len(), 2);
    assert_eq!(
        live.rows[0].names(),
        vec!["Req ID", "Req Title", "Node Name", "Test Case ID", "Test Case Title"]
    );
    assert_eq!(
        live.rows[0].values(),
        vec!["501", "Users can sign in", "Auth", "101", "Sign in"]
    );
    assert_eq!(
        live.rows[1].values(),
        vec!["502", "Users can reset passwords", "Auth", "", ""]
    );
    assert_eq!(live.rows[0].cells[0].color.as_deref(), Some("DCE6F1"));
    assert_eq!(live.rows[1].cells[0].color.as_deref(), Some("B8CCE4"));
    assert_eq!(live.rows[1].cells[3].color.as_deref(), Some("D8E4BC"));

    let snapshot = &traces[1];
    assert_eq!(snapshot.rows.len(), 1);
    let row = &snapshot.rows[0];
    assert_eq!(row.cells[0].name, "Test Case ID");
    assert!(row.cell("Work Item Type").is_some());
    assert_eq!(row.cell("Req ID").unwrap().value, "501");
    assert_eq!(row.cell("Req Title").unwrap().value, "Users can sign in");

    let relations = &traces[2];
    assert_eq!(relations.rows.len(), 2);
    assert_eq!(relations.rows[0].cell("PCR Title").unwrap().value, "Change login flow");
    assert_eq!(relations.rows[1].cell("Test Case ID").unwrap().value, "999");
    assert_eq!(relations.rows[1].cell("Test Case Title").unwrap().value, "");
    let target_names: Vec<&str> = relations.rows[0].names()[7..].to_vec();
    assert_eq!(target_names, vec!["Test Case ID", "Test Case Title", "Priority"]);

    assert!(traces[3].no_data);
    assert_eq!(traces[3].title, "Change request query");
}

#[tokio::test]
async fn skin_serializes_with_renderer_field_names() {
    let document = demo_document().await;
    let json = serde_json::to_value(&document).unwrap();
    let first_step = &json["suites"][1]["testCases"][0]["steps"][0][0];
    assert_eq!(first_step["name"], "#");
    assert_eq!(first_step["value"], "1");
    assert!(first_step.get("width").is_none());
    assert_eq!(json["traces"][3]["noData"], true);
}
