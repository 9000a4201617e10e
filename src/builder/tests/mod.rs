use super::*;
use crate::plan::{MASKED, ParameterValues, PlanAction};
use crate::types::{OMIT, ParameterType, Pseudo, RetentionPolicy};
use serde_json::json;
use yare::parameterized;

mod plan;

const DONT_CREATE: &str = "do-not-create";

const DATABASE_CLASSES: [&str; 6] = [
    "db.t2.micro",
    "db.t2.small",
    "db.t2.medium",
    "db.m4.large",
    "db.m4.xlarge",
    "db.r3.large",
];

const CONTAINER_A_CIDR: &str = "10.0.10.0/24";
const CONTAINER_B_CIDR: &str = "10.0.11.0/24";

struct Network {
    vpc: ResourceRef,
    subnet_a: ResourceRef,
    subnet_b: ResourceRef,
}

struct DatabaseStack {
    builder: TemplateBuilder,
    class: ParameterRef,
    password: ParameterRef,
    condition: GuardRef,
    security_group: ResourceRef,
    subnet_group: ResourceRef,
    instance: ResourceRef,
}

struct CertificateStack {
    builder: TemplateBuilder,
    domain: ParameterRef,
    alternates: ParameterRef,
    no_alternates: GuardRef,
    certificate: ResourceRef,
}

fn network(builder: &mut TemplateBuilder) -> Network {
    let vpc = builder
        .declare_resource(
            Resource::new("Vpc", "AWS::EC2::VPC").property("CidrBlock", "10.0.0.0/16"),
        )
        .unwrap();
    let subnet = |name: &str, cidr: &str| {
        Resource::new(name, "AWS::EC2::Subnet")
            .property("VpcId", &vpc)
            .property("CidrBlock", cidr)
    };
    let subnet_a = subnet("ContainerASubnet", CONTAINER_A_CIDR);
    let subnet_b = subnet("ContainerBSubnet", CONTAINER_B_CIDR);
    Network {
        subnet_a: builder.declare_resource(subnet_a).unwrap(),
        subnet_b: builder.declare_resource(subnet_b).unwrap(),
        vpc,
    }
}

fn database_class() -> Parameter {
    Parameter::string("DatabaseClass")
        .default_value("db.t2.micro")
        .description("Database instance class")
        .allowed_values(DATABASE_CLASSES)
        .optional(DONT_CREATE)
        .constraint_description("must select a valid database instance type.")
        .group("Database")
        .label("Instance Type")
}

fn ingress(cidr: &str) -> Value {
    Value::object([
        ("IpProtocol", Value::from("tcp")),
        ("FromPort", Value::from("5432")),
        ("ToPort", Value::from("5432")),
        ("CidrIp", Value::from(cidr)),
    ])
}

fn database_stack() -> DatabaseStack {
    database_stack_with(TemplateSettings::default())
}

fn database_stack_with(settings: TemplateSettings) -> DatabaseStack {
    let mut builder = TemplateBuilder::with_settings(settings).unwrap();
    let net = network(&mut builder);

    let class = builder.declare_parameter(database_class()).unwrap();
    let engine_version = builder
        .declare_parameter(
            Parameter::string("DatabaseEngineVersion")
                .default_value("")
                .description("Database engine version to use")
                .group("Database")
                .label("Engine Version"),
        )
        .unwrap();
    let name = builder
        .declare_parameter(
            Parameter::string("DatabaseName")
                .default_value("app")
                .description("Name of the database to create in the database server")
                .min_length(1)
                .max_length(64)
                .allowed_pattern("[a-zA-Z][a-zA-Z0-9_]*")
                .constraint_description(
                    "must begin with a letter and contain only alphanumeric characters.",
                )
                .group("Database")
                .label("Database Name"),
        )
        .unwrap();
    let user = builder
        .declare_parameter(
            Parameter::string("DatabaseUser")
                .default_value("app")
                .description("The database admin account username")
                .min_length(1)
                .max_length(16)
                .allowed_pattern("[a-zA-Z][a-zA-Z0-9]*")
                .group("Database")
                .label("Username"),
        )
        .unwrap();
    let password = builder
        .declare_parameter(
            Parameter::string("DatabasePassword")
                .no_echo()
                .description("The database admin account password")
                .min_length(10)
                .max_length(41)
                .allowed_pattern("[a-zA-Z0-9]*")
                .constraint_description("must consist of 10-41 alphanumeric characters.")
                .group("Database")
                .label("Password"),
        )
        .unwrap();
    let storage = builder
        .declare_parameter(
            Parameter::number("DatabaseAllocatedStorage")
                .default_value("20")
                .description("The size of the database (Gb)")
                .min_value(5.0)
                .max_value(1024.0)
                .constraint_description("must be between 5 and 1024Gb.")
                .group("Database")
                .label("Storage (GB)"),
        )
        .unwrap();
    let encrypted = builder
        .declare_parameter(
            Parameter::string("DatabaseStorageEncrypted")
                .default_value("false")
                .allowed_values(["true", "false"])
                .group("Database")
                .label("Enable Encrypted Storage"),
        )
        .unwrap();
    let multi_az = builder
        .declare_parameter(
            Parameter::string("DatabaseMultiAZ")
                .default_value("false")
                .allowed_values(["true", "false"])
                .constraint_description("must choose true or false.")
                .group("Database")
                .label("Enable MultiAZ"),
        )
        .unwrap();
    let retention_days = builder
        .declare_parameter(
            Parameter::number("DatabaseBackupRetentionDays")
                .default_value("30")
                .allowed_values((0..36).map(|n| n.to_string()))
                .group("Database")
                .label("Backup Retention Days"),
        )
        .unwrap();

    let condition = builder
        .declare_presence_guard("DatabaseCondition", &class)
        .unwrap();

    let security_group = builder
        .declare_resource(
            condition.attach(
                Resource::new("DatabaseSecurityGroup", "AWS::EC2::SecurityGroup")
                    .property("GroupDescription", "Database security group.")
                    .property("VpcId", &net.vpc)
                    .property(
                        "SecurityGroupIngress",
                        Value::list([ingress(CONTAINER_A_CIDR), ingress(CONTAINER_B_CIDR)]),
                    ),
            ),
        )
        .unwrap();
    let subnet_group = builder
        .declare_resource(
            condition.attach(
                Resource::new("DatabaseSubnetGroup", "AWS::RDS::DBSubnetGroup")
                    .property(
                        "DBSubnetGroupDescription",
                        "Subnets available for the RDS DB Instance",
                    )
                    .property("SubnetIds", Value::list([&net.subnet_a, &net.subnet_b])),
            ),
        )
        .unwrap();
    let instance = builder
        .declare_resource(
            condition.attach(
                Resource::durable("PostgreSQL", "AWS::RDS::DBInstance")
                    .property("DBName", &name)
                    .property("AllocatedStorage", &storage)
                    .property("DBInstanceClass", &class)
                    .property("Engine", "postgres")
                    .property("EngineVersion", &engine_version)
                    .property("MultiAZ", &multi_az)
                    .property("StorageEncrypted", &encrypted)
                    .property("StorageType", "gp2")
                    .property("MasterUsername", &user)
                    .property("MasterUserPassword", &password)
                    .property("DBSubnetGroupName", &subnet_group)
                    .property("VPCSecurityGroups", Value::list([&security_group]))
                    .property("BackupRetentionPeriod", &retention_days),
            ),
        )
        .unwrap();

    DatabaseStack {
        builder,
        class,
        password,
        condition,
        security_group,
        subnet_group,
        instance,
    }
}

fn certificate_stack() -> CertificateStack {
    let mut builder = TemplateBuilder::new();
    let domain = builder
        .declare_parameter(
            Parameter::string("DomainName")
                .description("The fully qualified domain name for the application")
                .group("Application")
                .label("Domain Name"),
        )
        .unwrap();
    let alternates = builder
        .declare_parameter(
            Parameter::new("DomainNameAlternates", ParameterType::CommaDelimitedList)
                .default_value("")
                .description("A comma-separated list of alternate domain names")
                .group("Application")
                .label("Alternate Domain Names"),
        )
        .unwrap();
    let no_alternates = builder
        .declare_guard("NoAlternateDomains", Condition::equals(&alternates, ""))
        .unwrap();

    let certificate = builder
        .declare_resource(
            Resource::new("Certificate", "AWS::CertificateManager::Certificate")
                .property("DomainName", &domain)
                .property(
                    "SubjectAlternativeNames",
                    no_alternates.select(OMIT, &alternates),
                )
                .property(
                    "DomainValidationOptions",
                    Value::list([Value::object([
                        ("DomainName", Value::from(&domain)),
                        ("ValidationDomain", Value::from(&domain)),
                    ])]),
                ),
        )
        .unwrap();

    CertificateStack {
        builder,
        domain,
        alternates,
        no_alternates,
        certificate,
    }
}

fn rendered(builder: &TemplateBuilder) -> serde_json::Value {
    builder.render().unwrap().to_value().unwrap()
}
