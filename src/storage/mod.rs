mod file;
pub mod watch;

pub use file::{parse_config, Storage};

/// 内置示例配置：一个项目，四个环境变量，两个模板
pub const DEFAULT_CONFIG_YAML: &str = r#"projects:
  - name: Project Example
    description: super app
    envs:
      - name: "host"
        description: this is host
        values:
          - example.com
          - value: test.example.com
            name: Test environment
      - name: ":subscriptionId"
        values:
          - "/1"
          - "/2"
      - name: "qs1"
        values:
          - a=b
          - c=d
      - name: "qs2"
        values:
          - x=y
          - z=w
    patterns:
      - pattern: "https://{host}/base{:subscriptionId}?{qs1}&{qs2}"
        type: url
        name: subscriptions page
      - pattern: "{host}/base{:subscriptionId}"
        type: str
        name: path only
"#;
