//! In-memory policy server
//!
//! Serves the policy interface from a fixed domain, account list and
//! privilege table. Open handles live in a table guarded by a
//! `parking_lot::Mutex`; a handle that is not in the table is answered with
//! `STATUS_INVALID_HANDLE`.

use crate::lsa::access;
use crate::lsa::operations::{
    Close, CloseResponse, EnumeratePrivileges, EnumeratePrivilegesResponse, LookupNames, LookupNamesResponse,
    OpenPolicy2, OpenPolicy2Response, QueryInformationPolicy, QueryInformationPolicyResponse, MAX_LOOKUP_NAMES,
};
use crate::lsa::types::{
    info_class, AuditLogInfo, DomainInfo, Luid, PolicyInformation, PrivilegeDefinition, PrivilegeEnumBuffer,
    ReferencedDomainList, Sid, SidNameUse, TranslatedSid, TranslatedSids, TrustInformation,
};
use msrpc::{Dispatcher, NtStatus};
use ndr::{ContextHandle, NdrConfig, Switched, UnicodeString, UniquePtr, Uuid};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Bytes charged against `prefered_maximum_length` per privilege returned
pub const PRIVILEGE_ENTRY_COST: u32 = 32;

/// Rights granted when the caller does not narrow its request
pub const DEFAULT_ALLOWED_ACCESS: u32 = access::POLICY_VIEW_LOCAL_INFORMATION
    | access::POLICY_VIEW_AUDIT_INFORMATION
    | access::POLICY_LOOKUP_NAMES;

const DEFAULT_PRIVILEGES: &[&str] = &[
    "SeCreateTokenPrivilege",
    "SeAssignPrimaryTokenPrivilege",
    "SeLockMemoryPrivilege",
    "SeIncreaseQuotaPrivilege",
    "SeMachineAccountPrivilege",
    "SeTcbPrivilege",
    "SeSecurityPrivilege",
    "SeTakeOwnershipPrivilege",
    "SeLoadDriverPrivilege",
    "SeSystemProfilePrivilege",
    "SeSystemtimePrivilege",
    "SeBackupPrivilege",
    "SeRestorePrivilege",
    "SeShutdownPrivilege",
];

/// An account the server can resolve by name
#[derive(Debug, Clone)]
pub struct Account {
    pub name: String,
    pub rid: u32,
    pub sid_use: SidNameUse,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct PolicyServerConfig {
    pub domain_name: String,
    pub domain_sid: Sid,
    pub accounts: Vec<Account>,
    pub privileges: Vec<String>,
    /// Rights any handle may be granted
    pub allowed_access: u32,
    pub ndr: NdrConfig,
}

impl PolicyServerConfig {
    pub fn new(domain_name: impl Into<String>, domain_sid: Sid) -> Self {
        Self {
            domain_name: domain_name.into(),
            domain_sid,
            accounts: Vec::new(),
            privileges: DEFAULT_PRIVILEGES.iter().map(|p| p.to_string()).collect(),
            allowed_access: DEFAULT_ALLOWED_ACCESS,
            ndr: NdrConfig::default(),
        }
    }

    pub fn with_account(mut self, name: impl Into<String>, rid: u32, sid_use: SidNameUse) -> Self {
        self.accounts.push(Account {
            name: name.into(),
            rid,
            sid_use,
        });
        self
    }

    pub fn with_allowed_access(mut self, allowed_access: u32) -> Self {
        self.allowed_access = allowed_access;
        self
    }

    pub fn with_privileges(mut self, privileges: Vec<String>) -> Self {
        self.privileges = privileges;
        self
    }
}

#[derive(Default)]
struct HandleTable {
    handles: HashMap<Uuid, u32>,
    next_id: u32,
}

impl HandleTable {
    fn insert(&mut self, granted_access: u32) -> ContextHandle {
        self.next_id = self.next_id.wrapping_add(1).max(1);
        let uuid = Uuid {
            data1: self.next_id,
            data2: 0x4c53,
            data3: 0x4150,
            data4: *b"policy\0\0",
        };
        self.handles.insert(uuid, granted_access);
        ContextHandle::new(0, uuid)
    }
}

/// In-memory policy server
pub struct PolicyServer {
    config: PolicyServerConfig,
    table: Mutex<HandleTable>,
}

impl PolicyServer {
    pub fn new(config: PolicyServerConfig) -> Self {
        Self {
            config,
            table: Mutex::new(HandleTable::default()),
        }
    }

    pub fn config(&self) -> &PolicyServerConfig {
        &self.config
    }

    pub fn open_handles(&self) -> usize {
        self.table.lock().handles.len()
    }

    /// Build a dispatcher with every operation of the interface registered
    pub fn dispatcher(self: &Arc<Self>) -> Dispatcher {
        let mut dispatcher = Dispatcher::with_config(self.config.ndr.clone());

        let server = Arc::clone(self);
        dispatcher.register(move |request: OpenPolicy2| {
            let server = Arc::clone(&server);
            async move { server.open_policy(request) }
        });

        let server = Arc::clone(self);
        dispatcher.register(move |request: Close| {
            let server = Arc::clone(&server);
            async move { server.close(request) }
        });

        let server = Arc::clone(self);
        dispatcher.register(move |request: EnumeratePrivileges| {
            let server = Arc::clone(&server);
            async move { server.enumerate_privileges(request) }
        });

        let server = Arc::clone(self);
        dispatcher.register(move |request: QueryInformationPolicy| {
            let server = Arc::clone(&server);
            async move { server.query_information(request) }
        });

        let server = Arc::clone(self);
        dispatcher.register(move |request: LookupNames| {
            let server = Arc::clone(&server);
            async move { server.lookup_names(request) }
        });

        info!("Policy server for {} registered 5 operations", self.config.domain_name);
        dispatcher
    }

    /// Access granted to `handle`, or `None` for an unknown handle
    fn granted_access(&self, handle: &ContextHandle) -> Option<u32> {
        self.table.lock().handles.get(&handle.uuid).copied()
    }

    /// Check `handle` carries `required` rights
    fn authorize(&self, handle: &ContextHandle, required: u32) -> Result<(), NtStatus> {
        let granted = self.granted_access(handle).ok_or(NtStatus::INVALID_HANDLE)?;
        if granted & required != required {
            debug!("handle {} lacks access {:#x}", handle.uuid, required);
            return Err(NtStatus::ACCESS_DENIED);
        }
        Ok(())
    }

    pub fn open_policy(&self, request: OpenPolicy2) -> (OpenPolicy2Response, NtStatus) {
        let system_name = request.system_name.as_ref().map(|s| s.as_str()).unwrap_or("<local>");
        let requested = if request.desired_access & access::MAXIMUM_ALLOWED != 0 {
            self.config.allowed_access
        } else {
            request.desired_access
        };
        if requested & !self.config.allowed_access != 0 {
            debug!("open on {} denied: requested {:#x}", system_name, requested);
            return (OpenPolicy2Response::default(), NtStatus::ACCESS_DENIED);
        }

        let policy = self.table.lock().insert(requested);
        debug!("opened policy handle {} on {}", policy.uuid, system_name);
        (OpenPolicy2Response { policy }, NtStatus::SUCCESS)
    }

    pub fn close(&self, request: Close) -> (CloseResponse, NtStatus) {
        if self.table.lock().handles.remove(&request.handle.uuid).is_none() {
            return (CloseResponse { handle: request.handle }, NtStatus::INVALID_HANDLE);
        }
        (CloseResponse { handle: ContextHandle::NIL }, NtStatus::SUCCESS)
    }

    pub fn enumerate_privileges(&self, request: EnumeratePrivileges) -> (EnumeratePrivilegesResponse, NtStatus) {
        let mut response = EnumeratePrivilegesResponse {
            enumeration_context: request.enumeration_context,
            buffer: PrivilegeEnumBuffer::default(),
        };
        if let Err(status) = self.authorize(&request.policy, access::POLICY_VIEW_LOCAL_INFORMATION) {
            return (response, status);
        }

        let privileges = &self.config.privileges;
        let start = request.enumeration_context as usize;
        if start >= privileges.len() {
            return (response, NtStatus::NO_MORE_ENTRIES);
        }
        let page = (request.prefered_maximum_length / PRIVILEGE_ENTRY_COST).max(1) as usize;
        let end = start.saturating_add(page).min(privileges.len());

        let entries = privileges[start..end]
            .iter()
            .enumerate()
            .map(|(i, name)| PrivilegeDefinition {
                name: UnicodeString::new(name),
                local_value: Luid::new((start + i + 2) as u32),
            })
            .collect();
        response.buffer = PrivilegeEnumBuffer::new(entries);
        response.enumeration_context = end as u32;

        let status = if end < privileges.len() {
            NtStatus::MORE_ENTRIES
        } else {
            NtStatus::SUCCESS
        };
        (response, status)
    }

    pub fn query_information(
        &self,
        request: QueryInformationPolicy,
    ) -> (QueryInformationPolicyResponse, NtStatus) {
        let required = if request.information_class == info_class::AUDIT_LOG {
            access::POLICY_VIEW_AUDIT_INFORMATION
        } else {
            access::POLICY_VIEW_LOCAL_INFORMATION
        };
        if let Err(status) = self.authorize(&request.policy, required) {
            return (QueryInformationPolicyResponse::default(), status);
        }

        let domain = || DomainInfo::new(&self.config.domain_name, self.config.domain_sid.clone());
        let information = match request.information_class {
            info_class::AUDIT_LOG => PolicyInformation::AuditLog(AuditLogInfo {
                maximum_log_size: 20 * 1024 * 1024,
                next_audit_record_id: 1,
                ..Default::default()
            }),
            info_class::PRIMARY_DOMAIN => PolicyInformation::PrimaryDomain(domain()),
            info_class::PD_ACCOUNT => PolicyInformation::PdAccount(UnicodeString::default()),
            info_class::ACCOUNT_DOMAIN | info_class::LOCAL_ACCOUNT_DOMAIN => {
                PolicyInformation::AccountDomain(domain())
            }
            class => {
                debug!("unsupported information class {}", class);
                return (QueryInformationPolicyResponse::default(), NtStatus::INVALID_PARAMETER);
            }
        };
        let information = Switched::with_selector(u32::from(request.information_class), information);
        (
            QueryInformationPolicyResponse {
                information: UniquePtr::new(information),
            },
            NtStatus::SUCCESS,
        )
    }

    pub fn lookup_names(&self, request: LookupNames) -> (LookupNamesResponse, NtStatus) {
        if let Err(status) = self.authorize(&request.policy, access::POLICY_LOOKUP_NAMES) {
            return (LookupNamesResponse::default(), status);
        }
        if request.names.len() > MAX_LOOKUP_NAMES {
            return (LookupNamesResponse::default(), NtStatus::INVALID_PARAMETER);
        }

        let sids: Vec<TranslatedSid> = request
            .names
            .iter()
            .map(|name| match name.as_string() {
                Ok(name) => self.translate(&name),
                Err(_) => TranslatedSid::unmapped(),
            })
            .collect();
        let mapped_count = sids.iter().filter(|s| s.is_mapped()).count() as u32;

        let mut referenced_domains = ReferencedDomainList::default();
        if mapped_count > 0 {
            referenced_domains.domains.push(TrustInformation {
                name: UnicodeString::new(&self.config.domain_name),
                sid: UniquePtr::new(self.config.domain_sid.clone()),
            });
            referenced_domains.entries = 1;
            referenced_domains.max_entries = 32;
        }

        let status = match mapped_count as usize {
            0 if !sids.is_empty() => NtStatus::NONE_MAPPED,
            n if n < sids.len() => NtStatus::SOME_NOT_MAPPED,
            _ => NtStatus::SUCCESS,
        };
        let response = LookupNamesResponse {
            referenced_domains: UniquePtr::new(referenced_domains),
            translated_sids: TranslatedSids::new(sids),
            mapped_count,
        };
        (response, status)
    }

    /// Resolve `name` or `DOMAIN\name`, case-insensitively
    fn translate(&self, name: &str) -> TranslatedSid {
        let account = match name.split_once('\\') {
            Some((domain, account)) if domain.eq_ignore_ascii_case(&self.config.domain_name) => account,
            Some(_) => return TranslatedSid::unmapped(),
            None => name,
        };
        self.config
            .accounts
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(account))
            .map(|a| TranslatedSid {
                sid_use: a.sid_use,
                relative_id: a.rid,
                domain_index: 0,
            })
            .unwrap_or_else(TranslatedSid::unmapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> PolicyServer {
        let config = PolicyServerConfig::new("HOST", Sid::new(5, vec![21, 1, 2, 3]))
            .with_account("alice", 1001, SidNameUse::USER)
            .with_account("Administrators", 544, SidNameUse::ALIAS);
        PolicyServer::new(config)
    }

    #[test]
    fn test_open_and_close() {
        let server = server();
        let (opened, status) = server.open_policy(OpenPolicy2::new(None, access::POLICY_LOOKUP_NAMES));
        assert_eq!(status, NtStatus::SUCCESS);
        assert!(!opened.policy.is_nil());
        assert_eq!(server.open_handles(), 1);

        let (closed, status) = server.close(Close { handle: opened.policy });
        assert_eq!(status, NtStatus::SUCCESS);
        assert!(closed.handle.is_nil());
        assert_eq!(server.open_handles(), 0);

        let (_, status) = server.close(Close { handle: opened.policy });
        assert_eq!(status, NtStatus::INVALID_HANDLE);
    }

    #[test]
    fn test_open_beyond_allowed_access() {
        let server = server();
        let (response, status) = server.open_policy(OpenPolicy2::new(None, 0x0001_0000));
        assert_eq!(status, NtStatus::ACCESS_DENIED);
        assert!(response.policy.is_nil());
    }

    #[test]
    fn test_translate_names() {
        let server = server();
        assert_eq!(server.translate("ALICE").relative_id, 1001);
        assert_eq!(server.translate("host\\Administrators").sid_use, SidNameUse::ALIAS);
        assert!(!server.translate("OTHER\\alice").is_mapped());
        assert!(!server.translate("mallory").is_mapped());
    }

    #[test]
    fn test_privilege_pages() {
        let server = server();
        let (opened, _) = server.open_policy(OpenPolicy2::new(None, access::MAXIMUM_ALLOWED));
        let request = EnumeratePrivileges {
            policy: opened.policy,
            enumeration_context: 0,
            prefered_maximum_length: PRIVILEGE_ENTRY_COST * 5,
        };
        let (page, status) = server.enumerate_privileges(request.clone());
        assert_eq!(status, NtStatus::MORE_ENTRIES);
        assert_eq!(page.buffer.entries, 5);
        assert_eq!(page.enumeration_context, 5);

        let last = EnumeratePrivileges {
            enumeration_context: DEFAULT_PRIVILEGES.len() as u32,
            ..request
        };
        let (_, status) = server.enumerate_privileges(last);
        assert_eq!(status, NtStatus::NO_MORE_ENTRIES);
    }
}
