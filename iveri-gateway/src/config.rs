//! Gateway credentials and endpoint selection.
//!
//! A [`Configuration`] is assembled with fluent `with_*` setters (or loaded from TOML)
//! and then validated once with [`Configuration::build`]. Only a built configuration is
//! accepted by the adapter. Any setter call on a built configuration clears the built
//! flag, so a configuration that has been validated can never be changed silently.
//!
//! # Examples
//!
//! ```
//! use iveri_gateway::config::{Configuration, Protocol};
//!
//! # fn example() -> iveri_gateway::error::Result<()> {
//! let config = Configuration::new()
//!     .with_user_group_id("group-1")
//!     .with_username("merchant")
//!     .with_password("s3cret")
//!     .with_application_id("{APP-ID}")
//!     .with_certificate_id("{CERT-ID}")
//!     .with_live(false)
//!     .with_protocol(Protocol::Rest)
//!     .build()?;
//!
//! assert!(config.is_built());
//! # Ok(())
//! # }
//! ```

use std::{fmt, path::Path};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

pub use crate::transport::HttpConfig;
use crate::error::{GatewayError, Result};

/// iVeri Enterprise REST API base URL.
pub const DEFAULT_GATEWAY_URL: &str = "https://portal.nedsecure.co.za/api/";

/// 3-D Secure (CardinalMPI) service URL used when the configuration is live.
pub const DEFAULT_CENTINEL_LIVE_URL: &str = "https://centinel400.cardinalcommerce.com/maps/txns.asp";

/// 3-D Secure (CardinalMPI) service URL used in test mode.
pub const DEFAULT_CENTINEL_TEST_URL: &str = "https://centineltest.cardinalcommerce.com/maps/txns.asp";

/// Legacy SOAP web service endpoint used when the configuration is live.
pub const DEFAULT_LEGACY_LIVE_URL: &str = "https://portal.iveri.co.za/iVeriWebService/Service.asmx";

/// Legacy SOAP web service endpoint used in test mode.
pub const DEFAULT_LEGACY_TEST_URL: &str =
    "https://portal.iveri.co.za/iVeriWebService/TestService.asmx";

/// Wire protocol used to reach the gateway.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// JSON over HTTPS with the signed `Authorization` header; 3-D Secure goes through
    /// the CardinalMPI service.
    #[default]
    Rest,
    /// Pipe-delimited SOAP web service (`lookup`, `authenticate`, `fProcessAndSettle`).
    Legacy,
}

impl Protocol {
    /// Returns the protocol name for logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::Legacy => "legacy",
        }
    }
}

/// Endpoint overrides for the secondary services.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Live 3-D Secure service URL.
    #[serde(default = "default_centinel_live")]
    pub centinel_live: String,

    /// Test 3-D Secure service URL.
    #[serde(default = "default_centinel_test")]
    pub centinel_test: String,

    /// Live legacy web service URL.
    #[serde(default = "default_legacy_live")]
    pub legacy_live: String,

    /// Test legacy web service URL.
    #[serde(default = "default_legacy_test")]
    pub legacy_test: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            centinel_live: default_centinel_live(),
            centinel_test: default_centinel_test(),
            legacy_live: default_legacy_live(),
            legacy_test: default_legacy_test(),
        }
    }
}

fn default_centinel_live() -> String {
    DEFAULT_CENTINEL_LIVE_URL.to_owned()
}

fn default_centinel_test() -> String {
    DEFAULT_CENTINEL_TEST_URL.to_owned()
}

fn default_legacy_live() -> String {
    DEFAULT_LEGACY_LIVE_URL.to_owned()
}

fn default_legacy_test() -> String {
    DEFAULT_LEGACY_TEST_URL.to_owned()
}

/// Validated gateway credentials and endpoint selection.
///
/// Read-only for the adapter. `Debug` output redacts both passwords.
pub struct Configuration {
    gateway: Option<String>,
    user_group_id: Option<String>,
    username: Option<String>,
    password: Option<SecretString>,
    application_id: Option<String>,
    certificate_id: Option<String>,
    live: Option<bool>,
    cmpi_processor_id: Option<String>,
    cmpi_merchant_id: Option<String>,
    cmpi_password: Option<SecretString>,
    protocol: Protocol,
    endpoints: EndpointConfig,
    http: HttpConfig,
    built: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Configuration {
    /// Creates an unbuilt configuration pointing at the iVeri Enterprise REST API.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gateway: Some(DEFAULT_GATEWAY_URL.to_owned()),
            user_group_id: None,
            username: None,
            password: None,
            application_id: None,
            certificate_id: None,
            live: None,
            cmpi_processor_id: None,
            cmpi_merchant_id: None,
            cmpi_password: None,
            protocol: Protocol::default(),
            endpoints: EndpointConfig::default(),
            http: HttpConfig::default(),
            built: false,
        }
    }

    /// Loads an unbuilt configuration from TOML.
    ///
    /// Passwords may be given inline (`password`) or through an environment variable
    /// (`password_env`). The result still has to be passed through [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] if the TOML does not parse or a named
    /// environment variable is unset.
    ///
    /// # Examples
    ///
    /// ```
    /// use iveri_gateway::config::{Configuration, Protocol};
    ///
    /// let toml = r#"
    ///     user_group_id = "group-1"
    ///     username = "merchant"
    ///     password = "s3cret"
    ///     application_id = "{APP-ID}"
    ///     certificate_id = "{CERT-ID}"
    ///     live = false
    ///     protocol = "legacy"
    /// "#;
    ///
    /// let config = Configuration::from_toml(toml).unwrap().build().unwrap();
    /// assert_eq!(config.protocol(), Protocol::Legacy);
    /// ```
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let file: ConfigurationFile = toml::from_str(toml_str)
            .map_err(|e| GatewayError::InvalidConfig(format!("invalid TOML config: {e}")))?;
        file.into_configuration()
    }

    /// Loads an unbuilt configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or its contents are invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GatewayError::InvalidConfig(format!("cannot read config file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Validates required fields and marks the configuration as built.
    ///
    /// Fields are checked in order: gateway, user group, username, password,
    /// application id, certificate id, live flag. The first failure is reported.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigurationValidation`] naming the first missing field,
    /// or [`GatewayError::InvalidConfig`] if the HTTP settings are out of range.
    pub fn build(mut self) -> Result<Self> {
        self.validate()?;
        self.http.validate()?;
        self.built = true;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let password = self.password.as_ref().map(ExposeSecret::expose_secret);
        let required = [
            (self.gateway.as_deref(), "The Gateway is required"),
            (self.user_group_id.as_deref(), "The User Group ID is required"),
            (self.username.as_deref(), "The Username is required"),
            (password, "The Password is required"),
            (self.application_id.as_deref(), "The Application ID is required"),
            (self.certificate_id.as_deref(), "The Certificate ID is required"),
        ];

        if let Some((_, message)) = required.iter().find(|(value, _)| is_blank(*value)) {
            return Err(GatewayError::ConfigurationValidation((*message).to_owned()));
        }

        if self.live.is_none() {
            return Err(GatewayError::ConfigurationValidation(
                "The API live boolean is required".to_owned(),
            ));
        }

        let gateway = self.gateway();
        Url::parse(gateway).map_err(|e| {
            GatewayError::ConfigurationValidation(format!(
                "The Gateway must be a valid URL ({gateway}): {e}"
            ))
        })?;

        Ok(())
    }

    /// Returns `true` once [`build`](Self::build) has succeeded and nothing changed since.
    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.built
    }

    /// Sets the REST gateway base URL.
    #[must_use]
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = Some(gateway.into());
        self.built = false;
        self
    }

    /// Sets the user group identifier.
    #[must_use]
    pub fn with_user_group_id(mut self, user_group_id: impl Into<String>) -> Self {
        self.user_group_id = Some(user_group_id.into());
        self.built = false;
        self
    }

    /// Sets the API username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.built = false;
        self
    }

    /// Sets the API password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self.built = false;
        self
    }

    /// Sets the application identifier.
    #[must_use]
    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self.built = false;
        self
    }

    /// Sets the certificate identifier.
    #[must_use]
    pub fn with_certificate_id(mut self, certificate_id: impl Into<String>) -> Self {
        self.certificate_id = Some(certificate_id.into());
        self.built = false;
        self
    }

    /// Selects live (`true`) or test (`false`) mode.
    #[must_use]
    pub fn with_live(mut self, live: bool) -> Self {
        self.live = Some(live);
        self.built = false;
        self
    }

    /// Sets the 3-D Secure processor credentials.
    #[must_use]
    pub fn with_cmpi_credentials(
        mut self,
        processor_id: impl Into<String>,
        merchant_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.cmpi_processor_id = Some(processor_id.into());
        self.cmpi_merchant_id = Some(merchant_id.into());
        self.cmpi_password = Some(SecretString::from(password.into()));
        self.built = false;
        self
    }

    /// Selects the wire protocol.
    #[must_use]
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self.built = false;
        self
    }

    /// Overrides the secondary service endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: EndpointConfig) -> Self {
        self.endpoints = endpoints;
        self.built = false;
        self
    }

    /// Overrides the HTTP client settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self.built = false;
        self
    }

    /// REST gateway base URL.
    #[must_use]
    pub fn gateway(&self) -> &str {
        self.gateway.as_deref().unwrap_or_default()
    }

    /// User group identifier.
    #[must_use]
    pub fn user_group_id(&self) -> &str {
        self.user_group_id.as_deref().unwrap_or_default()
    }

    /// API username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    /// API password. Callers must not log it.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_ref().map(ExposeSecret::expose_secret).unwrap_or_default()
    }

    /// Application identifier.
    #[must_use]
    pub fn application_id(&self) -> &str {
        self.application_id.as_deref().unwrap_or_default()
    }

    /// Certificate identifier.
    #[must_use]
    pub fn certificate_id(&self) -> &str {
        self.certificate_id.as_deref().unwrap_or_default()
    }

    /// Live mode flag. Unset counts as test mode.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.unwrap_or(false)
    }

    /// Gateway mode as sent on the wire (`Live` or `Test`).
    #[must_use]
    pub fn mode(&self) -> &'static str {
        if self.is_live() { "Live" } else { "Test" }
    }

    /// 3-D Secure processor identifier.
    #[must_use]
    pub fn cmpi_processor_id(&self) -> Option<&str> {
        self.cmpi_processor_id.as_deref()
    }

    /// 3-D Secure merchant identifier.
    #[must_use]
    pub fn cmpi_merchant_id(&self) -> Option<&str> {
        self.cmpi_merchant_id.as_deref()
    }

    /// 3-D Secure transaction password. Callers must not log it.
    #[must_use]
    pub fn cmpi_password(&self) -> Option<&str> {
        self.cmpi_password.as_ref().map(ExposeSecret::expose_secret)
    }

    /// Selected wire protocol.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// HTTP client settings.
    #[must_use]
    pub const fn http(&self) -> &HttpConfig {
        &self.http
    }

    /// 3-D Secure service URL for the current mode.
    #[must_use]
    pub fn centinel_url(&self) -> &str {
        if self.is_live() { &self.endpoints.centinel_live } else { &self.endpoints.centinel_test }
    }

    /// Legacy web service URL for the current mode.
    #[must_use]
    pub fn legacy_url(&self) -> &str {
        if self.is_live() { &self.endpoints.legacy_live } else { &self.endpoints.legacy_test }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("gateway", &self.gateway)
            .field("user_group_id", &self.user_group_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("application_id", &self.application_id)
            .field("certificate_id", &self.certificate_id)
            .field("live", &self.live)
            .field("cmpi_processor_id", &self.cmpi_processor_id)
            .field("cmpi_merchant_id", &self.cmpi_merchant_id)
            .field("cmpi_password", &self.cmpi_password.as_ref().map(|_| "[REDACTED]"))
            .field("protocol", &self.protocol)
            .field("endpoints", &self.endpoints)
            .field("http", &self.http)
            .field("built", &self.built)
            .finish()
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// On-disk shape of a configuration file.
#[derive(Debug, Deserialize)]
struct ConfigurationFile {
    #[serde(default = "default_gateway")]
    gateway: String,
    user_group_id: Option<String>,
    username: Option<String>,
    password: Option<String>,
    password_env: Option<String>,
    application_id: Option<String>,
    certificate_id: Option<String>,
    live: Option<bool>,
    #[serde(default)]
    protocol: Protocol,
    cmpi: Option<CmpiFile>,
    #[serde(default)]
    endpoints: EndpointConfig,
    #[serde(default)]
    http: HttpConfig,
}

#[derive(Debug, Deserialize)]
struct CmpiFile {
    processor_id: String,
    merchant_id: String,
    password: Option<String>,
    password_env: Option<String>,
}

fn default_gateway() -> String {
    DEFAULT_GATEWAY_URL.to_owned()
}

impl ConfigurationFile {
    fn into_configuration(self) -> Result<Configuration> {
        let password = resolve_secret(self.password, self.password_env.as_deref())?;
        let (cmpi_processor_id, cmpi_merchant_id, cmpi_password) = match self.cmpi {
            Some(cmpi) => (
                Some(cmpi.processor_id),
                Some(cmpi.merchant_id),
                resolve_secret(cmpi.password, cmpi.password_env.as_deref())?,
            ),
            None => (None, None, None),
        };

        Ok(Configuration {
            gateway: Some(self.gateway),
            user_group_id: self.user_group_id,
            username: self.username,
            password,
            application_id: self.application_id,
            certificate_id: self.certificate_id,
            live: self.live,
            cmpi_processor_id,
            cmpi_merchant_id,
            cmpi_password,
            protocol: self.protocol,
            endpoints: self.endpoints,
            http: self.http,
            built: false,
        })
    }
}

/// Inline value wins; otherwise the named environment variable must be set.
fn resolve_secret(inline: Option<String>, env_var: Option<&str>) -> Result<Option<SecretString>> {
    if let Some(value) = inline {
        return Ok(Some(SecretString::from(value)));
    }
    let Some(name) = env_var else {
        return Ok(None);
    };
    std::env::var(name).map(|value| Some(SecretString::from(value))).map_err(|_| {
        GatewayError::InvalidConfig(format!("environment variable {name} is not set"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> Configuration {
        Configuration::new()
            .with_user_group_id("group-1")
            .with_username("merchant")
            .with_password("s3cret")
            .with_application_id("{APP-ID}")
            .with_certificate_id("{CERT-ID}")
            .with_live(false)
    }

    fn build_error(config: Configuration) -> String {
        match config.build() {
            Err(GatewayError::ConfigurationValidation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_complete_configuration_builds() {
        let config = complete().build().unwrap();
        assert!(config.is_built());
        assert_eq!(config.gateway(), DEFAULT_GATEWAY_URL);
        assert_eq!(config.mode(), "Test");
        assert_eq!(config.protocol(), Protocol::Rest);
    }

    #[test]
    fn test_new_configuration_is_not_built() {
        assert!(!Configuration::new().is_built());
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        assert_eq!(build_error(Configuration::new()), "The User Group ID is required");
        assert_eq!(
            build_error(Configuration::new().with_user_group_id("g")),
            "The Username is required"
        );
        assert_eq!(
            build_error(Configuration::new().with_user_group_id("g").with_username("u")),
            "The Password is required"
        );
        assert_eq!(
            build_error(
                Configuration::new().with_user_group_id("g").with_username("u").with_password("p")
            ),
            "The Application ID is required"
        );
    }

    #[test]
    fn test_blank_gateway_rejected() {
        assert_eq!(build_error(complete().with_gateway("  ")), "The Gateway is required");
    }

    #[test]
    fn test_missing_live_flag_rejected() {
        let config = Configuration::new()
            .with_user_group_id("g")
            .with_username("u")
            .with_password("p")
            .with_application_id("a")
            .with_certificate_id("c");
        assert_eq!(build_error(config), "The API live boolean is required");
    }

    #[test]
    fn test_unparsable_gateway_rejected() {
        let message = build_error(complete().with_gateway("not a url"));
        assert!(message.starts_with("The Gateway must be a valid URL"));
    }

    #[test]
    fn test_setter_after_build_clears_built_flag() {
        let config = complete().build().unwrap().with_live(true);
        assert!(!config.is_built());
        assert!(config.build().unwrap().is_live());
    }

    #[test]
    fn test_mode_follows_live_flag() {
        let live = complete().with_live(true).build().unwrap();
        assert_eq!(live.mode(), "Live");
        assert_eq!(live.centinel_url(), DEFAULT_CENTINEL_LIVE_URL);
        assert_eq!(live.legacy_url(), DEFAULT_LEGACY_LIVE_URL);

        let test = complete().build().unwrap();
        assert_eq!(test.centinel_url(), DEFAULT_CENTINEL_TEST_URL);
        assert_eq!(test.legacy_url(), DEFAULT_LEGACY_TEST_URL);
    }

    #[test]
    fn test_invalid_http_settings_rejected() {
        let http = HttpConfig { timeout_secs: 0, ..Default::default() };
        let result = complete().with_http(http).build();
        assert!(matches!(result.unwrap_err(), GatewayError::InvalidConfig(_)));
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let config = complete().with_cmpi_credentials("proc", "merch", "cmpi-secret");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("cmpi-secret"));
    }

    #[test]
    fn test_from_toml_full() {
        let toml = r#"
            gateway = "https://gateway.example.com/api/"
            user_group_id = "group-1"
            username = "merchant"
            password = "s3cret"
            application_id = "{APP-ID}"
            certificate_id = "{CERT-ID}"
            live = true
            protocol = "legacy"

            [cmpi]
            processor_id = "134-01"
            merchant_id = "merchant-7"
            password = "cmpi-pass"

            [endpoints]
            legacy_live = "https://legacy.example.com/Service.asmx"

            [http]
            timeout_secs = 20
        "#;

        let config = Configuration::from_toml(toml).unwrap().build().unwrap();
        assert_eq!(config.gateway(), "https://gateway.example.com/api/");
        assert_eq!(config.protocol(), Protocol::Legacy);
        assert!(config.is_live());
        assert_eq!(config.cmpi_processor_id(), Some("134-01"));
        assert_eq!(config.cmpi_password(), Some("cmpi-pass"));
        assert_eq!(config.legacy_url(), "https://legacy.example.com/Service.asmx");
        assert_eq!(config.centinel_url(), DEFAULT_CENTINEL_LIVE_URL);
        assert_eq!(config.http().timeout_secs, 20);
    }

    #[test]
    fn test_from_toml_is_unbuilt() {
        let config = Configuration::from_toml("username = \"merchant\"").unwrap();
        assert!(!config.is_built());
        assert_eq!(config.gateway(), DEFAULT_GATEWAY_URL);
    }

    #[test]
    fn test_from_toml_missing_password_env() {
        let toml = r#"
            username = "merchant"
            password_env = "IVERI_GATEWAY_TEST_UNSET_VARIABLE"
        "#;
        let result = Configuration::from_toml(toml);
        assert!(matches!(result.unwrap_err(), GatewayError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_toml_invalid_syntax() {
        let result = Configuration::from_toml("this is = = not toml");
        assert!(matches!(result.unwrap_err(), GatewayError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let result = Configuration::from_file("/nonexistent/iveri.toml");
        assert!(matches!(result.unwrap_err(), GatewayError::InvalidConfig(_)));
    }
}
