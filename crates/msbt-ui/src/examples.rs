//! Example queries offered per source

use msbt_core::SourceKind;

pub const MONDAY_EXAMPLE: &str = "{ users { id name email } }";

pub const SALESFORCE_EXAMPLE: &str = "SELECT Id, IsDeleted, Name, CurrencyIsoCode, CreatedDate, \
CreatedById, LastModifiedDate, LastModifiedById, SystemModstamp, LastViewedDate, \
LastReferencedDate, AccountId, Type, ServiceContractId, ContractLineItemId, AssetId, StartDate, \
EndDate, SlaProcessId, BusinessHoursId, IsPerIncident, CasesPerEntitlement, RemainingCases, \
Status FROM Entitlement WHERE Name LIKE '%Adams and Reese LLP%'";

pub const SMARTSHEET_EXAMPLE: &str = "getSheetAsJSON(2888478287155076)";

pub fn example_query(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Monday => MONDAY_EXAMPLE,
        SourceKind::Salesforce => SALESFORCE_EXAMPLE,
        SourceKind::Smartsheet => SMARTSHEET_EXAMPLE,
    }
}
