use api_contract::{
    AttachEvidenceRequest, ReportDto, ScanRequest, SessionDto, SetCheckRequest,
    SubmitCheckRequest,
};
use serde_json::Value;

#[test]
fn session_dto_is_camel_case() {
    let dto = SessionDto {
        session_id: "s-1".to_string(),
        operator_id: "op1".to_string(),
        department: "security".to_string(),
        status: "active".to_string(),
        started_at_ms: 1_700_000_000_000,
        ended_at_ms: None,
        total_locations: 2,
        completed_locations: 1,
        progress_percentage: 50.0,
    };
    let value = serde_json::to_value(dto).expect("serialize");
    assert_eq!(value["sessionId"], "s-1");
    assert_eq!(value["totalLocations"], 2);
    assert_eq!(value["progressPercentage"], 50.0);
    assert!(value.get("ended_at_ms").is_none());
    assert!(matches!(value["startedAtMs"], Value::Number(_)));
}

#[test]
fn scan_request_accepts_raw_code_alias() {
    let req: ScanRequest = serde_json::from_str(r#"{"rawCode":"ENT-001\n"}"#).expect("parse");
    assert_eq!(req.code, "ENT-001\n");
    let req: ScanRequest = serde_json::from_str(r#"{"code":"PRK-B01"}"#).expect("parse");
    assert_eq!(req.code, "PRK-B01");
}

#[test]
fn set_check_request_accepts_check_name() {
    let req: SetCheckRequest =
        serde_json::from_str(r#"{"checkName":"CCTV operational","done":true}"#).expect("parse");
    assert_eq!(req.name, "CCTV operational");
    assert!(req.done);
}

#[test]
fn evidence_files_parse_camel_case() {
    let payload = r#"{"files":[{"fileName":"door.jpg","contentType":"image/jpeg","data":"https://cdn.example.com/door.jpg"},{"type":"image/png","data":"AQID"}]}"#;
    let req: AttachEvidenceRequest = serde_json::from_str(payload).expect("parse");
    assert_eq!(req.files.len(), 2);
    assert_eq!(req.files[0].file_name.as_deref(), Some("door.jpg"));
    assert_eq!(req.files[1].content_type, "image/png");
    assert!(req.files[1].file_name.is_none());
}

#[test]
fn submit_request_coordinates_are_optional() {
    let req: SubmitCheckRequest = serde_json::from_str("{}").expect("parse");
    assert!(req.coordinates.is_none());
    let req: SubmitCheckRequest =
        serde_json::from_str(r#"{"coordinates":{"lat":31.2,"lng":121.5}}"#).expect("parse");
    assert_eq!(req.coordinates.map(|value| value.lng), Some(121.5));
}

#[test]
fn report_dto_is_camel_case() {
    let dto = ReportDto {
        department: None,
        sessions_completed: 0,
        checks_recorded: 0,
        evidence_images: 0,
        average_duration_ms: 0,
        checks_with_coordinates_percentage: 0.0,
        checks_per_location: Vec::new(),
    };
    let value = serde_json::to_value(dto).expect("serialize");
    assert!(value.get("checksWithCoordinatesPercentage").is_some());
    assert!(value.get("checksPerLocation").is_some());
    assert!(value["department"].is_null());
}
