use polkit_protocol_types::SubjectRecord;
use std::collections::HashMap;
use zbus::proxy;
use zbus::zvariant::OwnedValue;

/// The subset of `org.freedesktop.PolicyKit1.Authority` an agent needs.
#[proxy(
    interface = "org.freedesktop.PolicyKit1.Authority",
    default_service = "org.freedesktop.PolicyKit1",
    default_path = "/org/freedesktop/PolicyKit1/Authority",
    gen_blocking = false
)]
pub(crate) trait PolkitAuthority {
    fn register_authentication_agent(
        &self,
        subject: &SubjectRecord<'_>,
        locale: &str,
        object_path: &str,
    ) -> zbus::Result<()>;

    fn register_authentication_agent_with_options(
        &self,
        subject: &SubjectRecord<'_>,
        locale: &str,
        object_path: &str,
        options: &HashMap<String, OwnedValue>,
    ) -> zbus::Result<()>;

    #[zbus(name = "AuthenticationAgentResponse2")]
    fn authentication_agent_response2(
        &self,
        uid: u32,
        cookie: &str,
        identity: &SubjectRecord<'_>,
    ) -> zbus::Result<()>;

    fn unregister_authentication_agent(
        &self,
        subject: &SubjectRecord<'_>,
        object_path: &str,
    ) -> zbus::Result<()>;
}
