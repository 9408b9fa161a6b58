//! Template fragment generators
//!
//! Pure functions from primitive parameters to partial templates. The
//! output never contains the `Auto` sentinel; it is merged into the
//! working template with [`Template::merge`](funpack_core::Template::merge).
//!
//! Generated infrastructure for `NasConfig: Auto`:
//!
//! ```text
//! FunNasVpc ── FunNasVSwitch ── FunNasMountTarget ── FunNasFileSystem
//!     └─ FunNasSecurityGroup          │
//!                                     ├─ <service> (NasConfig mounts /<service>)
//!                                     └─ FunNasCpService/nas-cp
//!                                            ▲
//! <service>NasCpInvoker ─ invokes ───────────┘ signals FunNasWaitConditionHandle
//!                                                        ▲
//! FunNasWaitCondition ─ waits for Count signals ─────────┘
//! ```

use serde_json::{Value as JsonValue, json};

use funpack_core::sentinel::{AUTO_MOUNT_DIR, NasIdentity};
use funpack_core::template::{FUNCTION_RESOURCE, LOG_RESOURCE, LOGSTORE_RESOURCE, SERVICE_RESOURCE};
use funpack_core::Fragment;

pub const VPC_ID: &str = "FunNasVpc";
pub const VSWITCH_ID: &str = "FunNasVSwitch";
pub const SECURITY_GROUP_ID: &str = "FunNasSecurityGroup";
pub const FILE_SYSTEM_ID: &str = "FunNasFileSystem";
pub const MOUNT_TARGET_ID: &str = "FunNasMountTarget";
pub const WAIT_HANDLE_ID: &str = "FunNasWaitConditionHandle";
pub const WAIT_CONDITION_ID: &str = "FunNasWaitCondition";
pub const NAS_SERVICE_ID: &str = "FunNasCpService";
pub const NAS_FUNCTION_NAME: &str = "nas-cp";

/// Where the copy service mounts the file system root
pub const NAS_SERVICE_MOUNT_DIR: &str = "/mnt/nas";

/// Seconds the wait condition allows for all copies to finish
const WAIT_TIMEOUT_SECS: u64 = 1800;

/// Availability zone used for the generated vswitch, per region
const REGION_ZONES: &[(&str, &str)] = &[
    ("cn-qingdao", "cn-qingdao-c"),
    ("cn-beijing", "cn-beijing-g"),
    ("cn-zhangjiakou", "cn-zhangjiakou-b"),
    ("cn-huhehaote", "cn-huhehaote-a"),
    ("cn-hangzhou", "cn-hangzhou-g"),
    ("cn-shanghai", "cn-shanghai-e"),
    ("cn-shenzhen", "cn-shenzhen-d"),
    ("cn-hongkong", "cn-hongkong-c"),
    ("ap-southeast-1", "ap-southeast-1a"),
    ("ap-southeast-2", "ap-southeast-2a"),
    ("ap-southeast-5", "ap-southeast-5a"),
    ("ap-northeast-1", "ap-northeast-1a"),
    ("ap-south-1", "ap-south-1a"),
    ("eu-central-1", "eu-central-1a"),
    ("us-west-1", "us-west-1a"),
    ("us-east-1", "us-east-1a"),
];

fn get_att(resource: &str, attribute: &str) -> JsonValue {
    json!({"Fn::GetAtt": [resource, attribute]})
}

fn reference(resource: &str) -> JsonValue {
    json!({"Ref": resource})
}

/// Concrete VpcConfig pointing at the generated network
pub fn vpc_config() -> JsonValue {
    json!({
        "VpcId": reference(VPC_ID),
        "VSwitchIds": [reference(VSWITCH_ID)],
        "SecurityGroupId": reference(SECURITY_GROUP_ID),
    })
}

/// Concrete NasConfig mounting `/<service>` of the generated file system
pub fn nas_config(service: &str, identity: NasIdentity) -> JsonValue {
    json!({
        "UserId": identity.user_id,
        "GroupId": identity.group_id,
        "MountPoints": [{
            "ServerAddr": {
                "Fn::Join": ["", [get_att(MOUNT_TARGET_ID, "MountTargetDomain"), format!(":/{}", service)]]
            },
            "MountDir": AUTO_MOUNT_DIR,
        }],
    })
}

/// Outputs listing the objects uploaded for `service`
pub fn event_outputs(bucket: &str, keys: &[String], service: &str) -> Fragment {
    let uris: Vec<String> = keys.iter().map(|k| format!("oss://{}/{}", bucket, k)).collect();
    Fragment::outputs([(
        format!("{}NasObjects", service),
        json!({
            "Description": format!("Archives copied onto NAS for service {}", service),
            "Value": uris.join(","),
        }),
    )])
}

/// Resource invoking the copy function once for `service` at deploy time
pub fn nas_cp_invoker(service: &str, bucket: &str, keys: &[String], identity: NasIdentity) -> Fragment {
    let event = json!({
        "serviceName": service,
        "bucket": bucket,
        "objects": keys,
        "dstDir": format!("{}/{}", NAS_SERVICE_MOUNT_DIR, service),
        "userId": identity.user_id,
        "groupId": identity.group_id,
    });
    // event JSON with the base64 signal command spliced in
    let mut head = event.to_string();
    head.pop();
    head.push_str(",\"waitCondition\":\"");

    Fragment::resources([(
        format!("{}NasCpInvoker", service),
        json!({
            "Type": "ALIYUN::FC::FunctionInvoker",
            "DependsOn": [NAS_SERVICE_ID, service],
            "Properties": {
                "ServiceName": get_att(NAS_SERVICE_ID, "ServiceName"),
                "FunctionName": get_att(&format!("{}{}", NAS_SERVICE_ID, NAS_FUNCTION_NAME), "FunctionName"),
                "Async": true,
                "Event": {
                    "Fn::Join": ["", [
                        head,
                        {"Fn::Base64Encode": get_att(WAIT_HANDLE_ID, "CurlCli")},
                        "\"}",
                    ]]
                },
            },
        }),
    )])
}

/// Region table the generated vswitch picks its zone from
pub fn region_map() -> Fragment {
    let regions: serde_json::Map<String, JsonValue> = REGION_ZONES
        .iter()
        .map(|(region, zone)| (region.to_string(), json!({"ZoneId": zone})))
        .collect();
    Fragment::section("Mappings", json!({"RegionMap": regions}))
}

/// Network and file system backing every `NasConfig: Auto` service
///
/// Each listed service is made to depend on the mount target. The wait
/// handle is only declared when something was uploaded, since only then
/// does anything signal it.
pub fn default_resources(service_names: &[String], any_upload: bool) -> Fragment {
    let mut resources = vec![
        (
            VPC_ID.to_string(),
            json!({
                "Type": "ALIYUN::ECS::VPC",
                "Properties": {"CidrBlock": "10.0.0.0/8", "VpcName": "fun-nas-vpc"},
            }),
        ),
        (
            VSWITCH_ID.to_string(),
            json!({
                "Type": "ALIYUN::ECS::VSwitch",
                "Properties": {
                    "VpcId": reference(VPC_ID),
                    "CidrBlock": "10.0.0.0/16",
                    "ZoneId": {"Fn::FindInMap": ["RegionMap", {"Ref": "ALIYUN::Region"}, "ZoneId"]},
                    "VSwitchName": "fun-nas-vswitch",
                },
            }),
        ),
        (
            SECURITY_GROUP_ID.to_string(),
            json!({
                "Type": "ALIYUN::ECS::SecurityGroup",
                "Properties": {"VpcId": reference(VPC_ID), "SecurityGroupName": "fun-nas-sg"},
            }),
        ),
        (
            FILE_SYSTEM_ID.to_string(),
            json!({
                "Type": "ALIYUN::NAS::FileSystem",
                "Properties": {"ProtocolType": "NFS", "StorageType": "Performance"},
            }),
        ),
        (
            MOUNT_TARGET_ID.to_string(),
            json!({
                "Type": "ALIYUN::NAS::MountTarget",
                "Properties": {
                    "FileSystemId": reference(FILE_SYSTEM_ID),
                    "NetworkType": "Vpc",
                    "VpcId": reference(VPC_ID),
                    "VSwitchId": reference(VSWITCH_ID),
                    "AccessGroupName": "DEFAULT_VPC_GROUP_NAME",
                },
            }),
        ),
    ];

    if any_upload {
        resources.push((
            WAIT_HANDLE_ID.to_string(),
            json!({"Type": "ALIYUN::ROS::WaitConditionHandle"}),
        ));
    }

    for service in service_names {
        resources.push((service.clone(), json!({"DependsOn": [MOUNT_TARGET_ID]})));
    }

    Fragment::resources(resources)
}

/// Service hosting the copy function, whose code is the bootstrap bundle
pub fn nas_service(code_uri: &str) -> Fragment {
    let identity = NasIdentity::default();
    Fragment::resources([(
        NAS_SERVICE_ID.to_string(),
        json!({
            "Type": SERVICE_RESOURCE,
            "DependsOn": [MOUNT_TARGET_ID],
            "Properties": {
                "Description": "Copies packaged archives onto NAS",
                "Policies": ["AliyunOSSReadOnlyAccess"],
                "VpcConfig": vpc_config(),
                "NasConfig": {
                    "UserId": identity.user_id,
                    "GroupId": identity.group_id,
                    "MountPoints": [{
                        "ServerAddr": {
                            "Fn::Join": ["", [get_att(MOUNT_TARGET_ID, "MountTargetDomain"), ":/"]]
                        },
                        "MountDir": NAS_SERVICE_MOUNT_DIR,
                    }],
                },
            },
            NAS_FUNCTION_NAME: {
                "Type": FUNCTION_RESOURCE,
                "Properties": {
                    "Handler": "index.handler",
                    "Runtime": "python3",
                    "CodeUri": code_uri,
                    "Timeout": 600,
                    "MemorySize": 1024,
                },
            },
        }),
    )])
}

/// Wait condition expecting `count` copy signals
pub fn wait_condition(count: usize) -> Fragment {
    Fragment::resources([(
        WAIT_CONDITION_ID.to_string(),
        json!({
            "Type": "ALIYUN::ROS::WaitCondition",
            "Properties": {
                "Handle": reference(WAIT_HANDLE_ID),
                "Count": count,
                "Timeout": WAIT_TIMEOUT_SECS,
            },
        }),
    )])
}

/// Outputs describing the generated file system
pub fn default_outputs() -> Fragment {
    Fragment::outputs([
        (
            "FunNasFileSystemId".to_string(),
            json!({"Description": "Generated NAS file system", "Value": reference(FILE_SYSTEM_ID)}),
        ),
        (
            "FunNasMountTargetDomain".to_string(),
            json!({
                "Description": "Mount target of the generated NAS file system",
                "Value": get_att(MOUNT_TARGET_ID, "MountTargetDomain"),
            }),
        ),
        (
            "FunNasCopyResult".to_string(),
            json!({
                "Description": "Signals sent by the NAS copy invocations",
                "Value": get_att(WAIT_CONDITION_ID, "Data"),
            }),
        ),
    ])
}

/// Log project with one logstore, shared by every `LogConfig: Auto` service
pub fn log_project(project: &str, logstore: &str) -> Fragment {
    Fragment::resources([(
        project.to_string(),
        json!({
            "Type": LOG_RESOURCE,
            "Properties": {"Description": "Function Compute logs generated by funpack"},
            logstore: {
                "Type": LOGSTORE_RESOURCE,
                "Properties": {"TTL": 362, "ShardCount": 1},
            },
        }),
    )])
}

/// Route target resolving to a service's and function's runtime names
pub fn route_target(service: &str, function: &str) -> JsonValue {
    json!({
        "ServiceName": get_att(service, "ServiceName"),
        "FunctionName": get_att(&format!("{}{}", service, function), "FunctionName"),
    })
}
