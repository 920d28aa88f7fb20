//! # Command Scripts
//!
//! A script is a JSON array of tagged commands, replayed in order against
//! one ledger. Each step yields an [`Outcome`] that `ledger-node` prints as
//! one JSON line. A result that cannot be represented as JSON (an amount
//! beyond `u64` in a `serde_json::Value`) fails the replay instead of being
//! dropped.
//!
//! ```json
//! [
//!   {"command": "request_role", "requester": "0x0f0f...", "role": "farmer"},
//!   {"command": "approve_role", "caller": "0xadad...", "requester": "0x0f0f...", "role": "farmer"},
//!   {"command": "trace", "node": {"kind": "unit", "id": 1}}
//! ]
//! ```

use crate::ports::{EventPublisher, LedgerStore, TimeSource};
use crate::service::{Committed, ProvenanceLedger};
use ap_02_asset_graph::SplitRequest;
use ap_03_exchange::{PurchaseReceipt, Resolution, Settlement};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::{
    Address, Amount, LedgerError, Listing, NodeRef, OriginAttributes, PackId, PurchaseId,
    Quantity, RequestId, RetailUnitId, Role, Visibility,
};

/// One scripted operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    RequestRole {
        requester: Address,
        role: Role,
        #[serde(default)]
        id_hash: Option<String>,
        #[serde(default)]
        meta: Option<String>,
    },
    ApproveRole {
        caller: Address,
        requester: Address,
        role: Role,
    },
    AssignCustomer {
        requester: Address,
    },
    AddOriginLot {
        farmer: Address,
        attributes: OriginAttributes,
        quantity: Quantity,
        price_per_unit: Amount,
        visibility: Visibility,
    },
    Split {
        caller: Address,
        parent: NodeRef,
        children: SplitRequest,
    },
    ListPack {
        caller: Address,
        pack: PackId,
        listing: Listing,
    },
    ListUnit {
        caller: Address,
        unit: RetailUnitId,
        listing: Listing,
    },
    Deactivate {
        caller: Address,
        node: NodeRef,
    },
    BuyDirect {
        buyer: Address,
        node: NodeRef,
        quantity: Quantity,
        payment: Amount,
    },
    CreateBuyRequest {
        requester: Address,
        pack: PackId,
        quantity: Quantity,
        #[serde(default)]
        wants_retailer_role: bool,
        payment: Amount,
    },
    ResolveBuyRequest {
        caller: Address,
        request: RequestId,
        accept: bool,
    },
    Inventory {
        owner: Address,
    },
    PendingBuyRequests {
        owner: Address,
    },
    PurchaseHistory {
        participant: Address,
    },
    Trace {
        node: NodeRef,
    },
    PurchaseTrace {
        purchase: PurchaseId,
    },
    Balance {
        participant: Address,
    },
    VerifyLog,
    Stats,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestRole { .. } => "request_role",
            Self::ApproveRole { .. } => "approve_role",
            Self::AssignCustomer { .. } => "assign_customer",
            Self::AddOriginLot { .. } => "add_origin_lot",
            Self::Split { .. } => "split",
            Self::ListPack { .. } => "list_pack",
            Self::ListUnit { .. } => "list_unit",
            Self::Deactivate { .. } => "deactivate",
            Self::BuyDirect { .. } => "buy_direct",
            Self::CreateBuyRequest { .. } => "create_buy_request",
            Self::ResolveBuyRequest { .. } => "resolve_buy_request",
            Self::Inventory { .. } => "inventory",
            Self::PendingBuyRequests { .. } => "pending_buy_requests",
            Self::PurchaseHistory { .. } => "purchase_history",
            Self::Trace { .. } => "trace",
            Self::PurchaseTrace { .. } => "purchase_trace",
            Self::Balance { .. } => "balance",
            Self::VerifyLog => "verify_log",
            Self::Stats => "stats",
        }
    }
}

/// A rejected step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub code: &'static str,
    pub message: String,
}

impl From<&LedgerError> for ErrorReport {
    fn from(error: &LedgerError) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
        }
    }
}

/// Result of one script step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Outcome {
    pub step: usize,
    pub command: &'static str,
    pub ok: bool,
    /// Store version after the step; absent for queries and rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub result: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl Outcome {
    fn committed<T: Serialize>(
        step: usize,
        command: &'static str,
        committed: Committed<T>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            step,
            command,
            ok: true,
            version: Some(committed.version()),
            result: to_json(&committed.value)?,
            error: None,
        })
    }

    fn answered<T: Serialize>(
        step: usize,
        command: &'static str,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            step,
            command,
            ok: true,
            version: None,
            result: to_json(value)?,
            error: None,
        })
    }

    fn rejected(step: usize, command: &'static str, error: &LedgerError) -> Self {
        Self {
            step,
            command,
            ok: false,
            version: None,
            result: Value::Null,
            error: Some(ErrorReport::from(error)),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum ResolutionView<'a> {
    Approved {
        receipt: &'a PurchaseReceipt,
        granted_retailer: bool,
    },
    Declined {
        settlement: &'a Settlement,
    },
    Failed {
        settlement: &'a Settlement,
        error: ErrorReport,
    },
}

impl<'a> From<&'a Resolution> for ResolutionView<'a> {
    fn from(resolution: &'a Resolution) -> Self {
        match resolution {
            Resolution::Approved {
                receipt,
                granted_retailer,
            } => Self::Approved {
                receipt,
                granted_retailer: *granted_retailer,
            },
            Resolution::Declined { settlement } => Self::Declined { settlement },
            Resolution::Failed { settlement, error } => Self::Failed {
                settlement,
                error: ErrorReport::from(error),
            },
        }
    }
}

#[derive(Serialize)]
struct BalanceView {
    participant: Address,
    balance: Amount,
    escrow_held: Amount,
}

/// Parses a JSON command script.
pub fn parse_script(json: &str) -> Result<Vec<Command>, serde_json::Error> {
    serde_json::from_str(json)
}

fn settle<T: Serialize>(
    step: usize,
    command: &'static str,
    result: Result<Committed<T>, LedgerError>,
) -> Result<Outcome, serde_json::Error> {
    match result {
        Ok(committed) => Outcome::committed(step, command, committed),
        Err(error) => Ok(Outcome::rejected(step, command, &error)),
    }
}

fn answer<T: Serialize>(
    step: usize,
    command: &'static str,
    result: Result<T, LedgerError>,
) -> Result<Outcome, serde_json::Error> {
    match result {
        Ok(value) => Outcome::answered(step, command, &value),
        Err(error) => Ok(Outcome::rejected(step, command, &error)),
    }
}

/// Runs one command against `ledger`.
///
/// # Errors
/// Ledger rejections are reported inside the [`Outcome`]. The `Err` case is
/// reserved for a result that cannot be converted to JSON; the command itself
/// may already be committed when that happens.
pub fn execute<S, P, T>(
    ledger: &ProvenanceLedger<S, P, T>,
    step: usize,
    command: Command,
) -> Result<Outcome, serde_json::Error>
where
    S: LedgerStore,
    P: EventPublisher,
    T: TimeSource,
{
    let name = command.name();
    match command {
        Command::RequestRole {
            requester,
            role,
            id_hash,
            meta,
        } => settle(step, name, ledger.request_role(requester, role, id_hash, meta)),
        Command::ApproveRole {
            caller,
            requester,
            role,
        } => settle(step, name, ledger.approve_role(caller, requester, role)),
        Command::AssignCustomer { requester } => {
            settle(step, name, ledger.assign_customer(requester))
        }
        Command::AddOriginLot {
            farmer,
            attributes,
            quantity,
            price_per_unit,
            visibility,
        } => settle(
            step,
            name,
            ledger.add_origin_lot(farmer, attributes, quantity, price_per_unit, visibility),
        ),
        Command::Split {
            caller,
            parent,
            children,
        } => settle(step, name, ledger.split(caller, parent, &children)),
        Command::ListPack {
            caller,
            pack,
            listing,
        } => settle(step, name, ledger.list_pack(caller, pack, listing)),
        Command::ListUnit {
            caller,
            unit,
            listing,
        } => settle(step, name, ledger.list_unit(caller, unit, listing)),
        Command::Deactivate { caller, node } => settle(step, name, ledger.deactivate(caller, node)),
        Command::BuyDirect {
            buyer,
            node,
            quantity,
            payment,
        } => settle(step, name, ledger.buy_direct(buyer, node, quantity, payment)),
        Command::CreateBuyRequest {
            requester,
            pack,
            quantity,
            wants_retailer_role,
            payment,
        } => settle(
            step,
            name,
            ledger.create_buy_request(requester, pack, quantity, wants_retailer_role, payment),
        ),
        Command::ResolveBuyRequest {
            caller,
            request,
            accept,
        } => match ledger.resolve_buy_request(caller, request, accept) {
            Ok(committed) => Ok(Outcome {
                step,
                command: name,
                ok: true,
                version: Some(committed.version()),
                result: to_json(&ResolutionView::from(&committed.value))?,
                error: None,
            }),
            Err(error) => {
                let mut outcome = Outcome::rejected(step, name, &error);
                // A failed fill still commits the refund.
                if let Ok(filed) = ledger.buy_request(request) {
                    if !filed.is_pending() {
                        outcome.version = Some(ledger.stats().version);
                        outcome.result = to_json(&filed)?;
                    }
                }
                Ok(outcome)
            }
        },
        Command::Inventory { owner } => Outcome::answered(step, name, &ledger.inventory_of(&owner)),
        Command::PendingBuyRequests { owner } => {
            Outcome::answered(step, name, &ledger.pending_buy_requests(&owner))
        }
        Command::PurchaseHistory { participant } => {
            Outcome::answered(step, name, &ledger.purchase_history(&participant))
        }
        Command::Trace { node } => answer(step, name, ledger.trace(node).map(|t| t.entries())),
        Command::PurchaseTrace { purchase } => answer(
            step,
            name,
            ledger.purchase_trace(purchase).map(|t| t.entries()),
        ),
        Command::Balance { participant } => Outcome::answered(
            step,
            name,
            &BalanceView {
                participant,
                balance: ledger.balance_of(&participant),
                escrow_held: ledger.escrow_held(),
            },
        ),
        Command::VerifyLog => match ledger.verify_purchase_log() {
            Ok(()) => Outcome::answered(step, name, &json!({ "intact": true })),
            Err(error) => Outcome::answered(
                step,
                name,
                &json!({ "intact": false, "error": error.to_string() }),
            ),
        },
        Command::Stats => Outcome::answered(step, name, &ledger.stats()),
    }
}
