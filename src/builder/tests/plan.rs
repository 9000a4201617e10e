use super::*;

fn database_values() -> ParameterValues {
    ParameterValues::new().with("DatabasePassword", "correcthorse42")
}

#[test]
fn test_plan_creates_database_with_defaults() {
    let stack = database_stack();
    let plan = stack.builder.render().unwrap().plan(&database_values()).unwrap();

    assert_eq!(plan.guard("DatabaseCondition"), Some(true));
    assert!(plan.is_created(stack.instance.name()));
    assert!(plan.warnings().is_empty());

    let instance = plan.resource("PostgreSQL").unwrap();
    assert_eq!(instance.action, PlanAction::Create);
    assert_eq!(instance.properties["DBInstanceClass"], json!("db.t2.micro"));
    assert_eq!(instance.properties["AllocatedStorage"], json!("20"));
    assert_eq!(instance.properties["DBSubnetGroupName"], json!({"Ref": "DatabaseSubnetGroup"}));
}

#[test]
fn test_plan_masks_no_echo_values() {
    let stack = database_stack();
    let plan = stack.builder.render().unwrap().plan(&database_values()).unwrap();

    let instance = plan.resource("PostgreSQL").unwrap();
    assert_eq!(instance.properties["MasterUserPassword"], json!(MASKED));
    let text = serde_json::to_string(&plan).unwrap();
    assert!(!text.contains("correcthorse42"));
}

#[test]
fn test_plan_skips_database_for_sentinel() {
    let stack = database_stack();
    let values = database_values().with("DatabaseClass", DONT_CREATE);
    let plan = stack.builder.render().unwrap().plan(&values).unwrap();

    assert_eq!(plan.guard("DatabaseCondition"), Some(false));
    for resource in [&stack.security_group, &stack.subnet_group, &stack.instance] {
        let planned = plan.resource(resource.name()).unwrap();
        assert_eq!(planned.action, PlanAction::Skip);
        assert!(planned.properties.is_empty());
    }
    assert!(plan.is_created("Vpc"));
    assert_eq!(plan.created().count(), 3);
}

#[parameterized(
    no_alternates = { "", false, None },
    single = { "www.example.com", true, Some(json!(["www.example.com"])) },
    several = { "a.example.com,b.example.com", true, Some(json!(["a.example.com", "b.example.com"])) },
)]
fn test_plan_alternate_names(alternates: &str, present: bool, expected: Option<serde_json::Value>) {
    let stack = certificate_stack();
    let values = ParameterValues::new()
        .with(stack.domain.name(), "example.com")
        .with(stack.alternates.name(), alternates);
    let plan = stack.builder.render().unwrap().plan(&values).unwrap();

    assert_eq!(plan.guard(stack.no_alternates.name()), Some(!present));
    let certificate = plan.resource(stack.certificate.name()).unwrap();
    assert_eq!(
        certificate.properties.get("SubjectAlternativeNames").cloned(),
        expected
    );
    assert_eq!(certificate.properties["DomainName"], json!("example.com"));
    assert_eq!(
        certificate.properties["DomainValidationOptions"],
        json!([{"DomainName": "example.com", "ValidationDomain": "example.com"}])
    );
}

#[test]
fn test_plan_requires_values_without_defaults() {
    let stack = database_stack();
    let err = stack
        .builder
        .render()
        .unwrap()
        .plan(&ParameterValues::new())
        .unwrap_err();
    assert_eq!(err, TemplateError::MissingValue("DatabasePassword".to_string()));
}

#[test]
fn test_plan_rejects_unknown_and_invalid_values() {
    let document = database_stack().builder.render().unwrap();

    let err = document
        .plan(&database_values().with("DatabaseSize", "large"))
        .unwrap_err();
    assert!(matches!(
        err,
        TemplateError::UnknownReference { namespace: Namespace::Parameter, ref target, .. } if target == "DatabaseSize"
    ));

    let err = document
        .plan(&database_values().with("DatabaseAllocatedStorage", "2048"))
        .unwrap_err();
    assert!(matches!(err, TemplateError::InvalidConstraint { .. }));

    let err = document
        .plan(&ParameterValues::new().with("DatabasePassword", "short"))
        .unwrap_err();
    assert!(err.to_string().contains("<redacted>"));
}

#[test]
fn test_plan_warns_on_reference_to_skipped_resource() {
    let mut stack = database_stack();
    stack
        .builder
        .declare_resource(
            Resource::new("Alarms", "AWS::SNS::Topic")
                .property("DisplayName", Value::get_att(&stack.instance, "Endpoint.Address")),
        )
        .unwrap();
    stack
        .builder
        .declare_output(Output::new("DatabaseEndpoint", Value::get_att(&stack.instance, "Endpoint.Address")))
        .unwrap();

    let values = database_values().with("DatabaseClass", DONT_CREATE);
    let plan = stack.builder.render().unwrap().plan(&values).unwrap();

    assert!(plan.is_created("Alarms"));
    assert_eq!(
        plan.warnings(),
        [
            "resource 'Alarms' references skipped resource 'PostgreSQL'".to_string(),
            "output 'DatabaseEndpoint' references skipped resource 'PostgreSQL'".to_string(),
        ]
    );
}

#[test]
fn test_plan_evaluates_composite_guards() {
    let mut stack = database_stack();
    let large = stack
        .builder
        .declare_guard("IsLarge", Condition::equals(&stack.class, "db.m4.large"))
        .unwrap();
    let xlarge = stack
        .builder
        .declare_guard("IsXLarge", Condition::equals(&stack.class, "db.m4.xlarge"))
        .unwrap();
    stack
        .builder
        .declare_guard("IsBig", Condition::any([Condition::guard(&large), Condition::guard(&xlarge)]))
        .unwrap();
    stack
        .builder
        .declare_guard("IsSmall", !Condition::guard(&GuardRef::new("IsBig")))
        .unwrap();

    let document = stack.builder.render().unwrap();
    let plan = document
        .plan(&database_values().with("DatabaseClass", "db.m4.xlarge"))
        .unwrap();
    assert_eq!(plan.guard("IsLarge"), Some(false));
    assert_eq!(plan.guard("IsBig"), Some(true));
    assert_eq!(plan.guard("IsSmall"), Some(false));

    let plan = document.plan(&database_values()).unwrap();
    assert_eq!(plan.guard("IsBig"), Some(false));
    assert_eq!(plan.guard("IsSmall"), Some(true));
}

#[test]
fn test_plan_outputs_follow_guards() {
    let mut stack = database_stack();
    stack
        .builder
        .declare_output(
            Output::new("DatabaseEndpoint", Value::get_att(&stack.instance, "Endpoint.Address"))
                .guarded_by(&stack.condition),
        )
        .unwrap();
    let document = stack.builder.render().unwrap();

    let plan = document.plan(&database_values()).unwrap();
    let output = plan.output("DatabaseEndpoint").unwrap();
    assert_eq!(output.action, PlanAction::Create);
    assert_eq!(
        output.value,
        Some(json!({"Fn::GetAtt": ["PostgreSQL", "Endpoint.Address"]}))
    );

    let plan = document
        .plan(&database_values().with("DatabaseClass", DONT_CREATE))
        .unwrap();
    let output = plan.output("DatabaseEndpoint").unwrap();
    assert_eq!(output.action, PlanAction::Skip);
    assert_eq!(output.value, None);
    assert!(plan.warnings().is_empty());
}

#[test]
fn test_plan_joins_resolved_strings() {
    let mut builder = TemplateBuilder::new();
    let environment = builder
        .declare_parameter(Parameter::string("Environment").default_value("staging"))
        .unwrap();
    builder
        .declare_resource(Resource::new("Bucket", "AWS::S3::Bucket").property(
            "BucketName",
            Value::join("-", [Value::from("assets"), Value::from(&environment)]),
        ))
        .unwrap();
    builder
        .declare_resource(Resource::new("Logs", "AWS::S3::Bucket").property(
            "BucketName",
            Value::join("-", [Value::from(&environment), Value::from(Pseudo::Region)]),
        ))
        .unwrap();

    let plan = builder.render().unwrap().plan(&ParameterValues::new()).unwrap();
    assert_eq!(
        plan.resource("Bucket").unwrap().properties["BucketName"],
        json!("assets-staging")
    );
    assert_eq!(
        plan.resource("Logs").unwrap().properties["BucketName"],
        json!({"Fn::Join": ["-", ["staging", {"Ref": "AWS::Region"}]]})
    );
}
