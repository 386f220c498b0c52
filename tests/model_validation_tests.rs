use job_board::models::{
    CreateJobRequest, Job, RegisterUserRequest, UpdateJobRequest, UpdateUserRequest, User,
    check_salary_range,
};
use rust_decimal::Decimal;
use validator::Validate;

// --- Test Utilities ---

fn job_request(from: i64, to: i64) -> CreateJobRequest {
    CreateJobRequest {
        title: "Охранник".to_string(),
        description: "Охрана кукурузы".to_string(),
        salary_from: Decimal::from(from),
        salary_to: Decimal::from(to),
        is_active: true,
    }
}

fn registration(password: &str, password2: &str) -> RegisterUserRequest {
    RegisterUserRequest {
        name: "Ivan".to_string(),
        email: "ivan@example.com".to_string(),
        password: password.to_string(),
        password2: password2.to_string(),
        is_company: false,
    }
}

// --- Tests ---

#[test]
fn test_create_job_salary_range() {
    assert!(job_request(15000, 35000).validate().is_ok());
    // Equal bounds are a valid fixed salary.
    assert!(job_request(20000, 20000).validate().is_ok());

    assert!(job_request(0, 35000).validate().is_err(), "salary_from must be positive");
    assert!(job_request(-1, 35000).validate().is_err());
    assert!(job_request(35000, 15000).validate().is_err(), "salary_to below salary_from");
}

#[test]
fn test_create_job_title_required() {
    let mut req = job_request(1, 2);
    req.title = String::new();
    assert!(req.validate().is_err());
}

#[test]
fn test_create_job_defaults_from_json() {
    let req: CreateJobRequest = serde_json::from_str(
        r#"{"title": "Охранник", "salary_from": 15000, "salary_to": "35000.50"}"#,
    )
    .unwrap();

    assert!(req.is_active, "jobs are active unless stated otherwise");
    assert_eq!(req.description, "");
    assert_eq!(req.salary_to, Decimal::new(3500050, 2));
}

#[test]
fn test_update_job_request_partial_salary() {
    let only_to = UpdateJobRequest {
        salary_to: Some(Decimal::from(100)),
        ..UpdateJobRequest::default()
    };
    assert!(only_to.validate().is_ok());

    let negative = UpdateJobRequest {
        salary_from: Some(Decimal::from(-5)),
        ..UpdateJobRequest::default()
    };
    assert!(negative.validate().is_err());

    let inverted = UpdateJobRequest {
        salary_from: Some(Decimal::from(10)),
        salary_to: Some(Decimal::from(5)),
        ..UpdateJobRequest::default()
    };
    assert!(inverted.validate().is_err());
}

#[test]
fn test_update_job_request_merge_keeps_absent_fields() {
    let job = Job {
        id: 1,
        user_id: 2,
        title: "Old".to_string(),
        description: "Desc".to_string(),
        salary_from: Decimal::from(10),
        salary_to: Decimal::from(20),
        is_active: true,
        ..Job::default()
    };
    let merged = UpdateJobRequest {
        title: Some("New".to_string()),
        is_active: Some(false),
        ..UpdateJobRequest::default()
    }
    .apply_to(job);

    assert_eq!(merged.title, "New");
    assert_eq!(merged.description, "Desc");
    assert_eq!(merged.salary_to, Decimal::from(20));
    assert!(!merged.is_active);
    assert_eq!(merged.user_id, 2, "ownership is never changed by an update");

    // The merged row can still break the invariant; callers re-check it.
    let lowered = UpdateJobRequest {
        salary_to: Some(Decimal::from(5)),
        ..UpdateJobRequest::default()
    }
    .apply_to(merged);
    assert!(check_salary_range(lowered.salary_from, lowered.salary_to).is_err());
}

#[test]
fn test_register_user_rules() {
    assert!(registration("secret1", "secret1").validate().is_ok());
    assert!(registration("secret1", "secret2").validate().is_err(), "passwords must match");
    assert!(registration("abc", "abc").validate().is_err(), "password too short");

    let mut bad_email = registration("secret1", "secret1");
    bad_email.email = "not-an-email".to_string();
    assert!(bad_email.validate().is_err());
}

#[test]
fn test_update_user_request_optionality() {
    let partial = UpdateUserRequest {
        name: Some("New Name".to_string()),
        ..UpdateUserRequest::default()
    };
    assert!(partial.validate().is_ok());

    let json_output = serde_json::to_string(&partial).unwrap();
    assert!(json_output.contains(r#""name":"New Name""#));
    assert!(!json_output.contains("is_company"));

    let bad_email = UpdateUserRequest {
        email: Some("nope".to_string()),
        ..UpdateUserRequest::default()
    };
    assert!(bad_email.validate().is_err());
}

#[test]
fn test_user_password_hash_never_serialized() {
    let user = User {
        id: 7,
        name: "Ivan".to_string(),
        email: "ivan@example.com".to_string(),
        password_hash: "credential-ref".to_string(),
        is_company: false,
        ..User::default()
    };

    let json_output = serde_json::to_string(&user).unwrap();
    assert!(!json_output.contains("password_hash"));
    assert!(!json_output.contains("credential-ref"));

    // Round trip through the API shape still works without the hash.
    let parsed: User = serde_json::from_str(&json_output).unwrap();
    assert_eq!(parsed.id, 7);
    assert_eq!(parsed.password_hash, "");
}
