//! Known bank header layouts
//!
//! Static data: bank id → candidate header names per column role, in
//! preference order. Adding a bank is adding an entry.

/// Candidate header names for each column role
#[derive(Debug)]
pub struct BankProfile {
    pub id: &'static str,
    /// Case-insensitive substrings of any header that identify this bank
    pub markers: &'static [&'static str],
    pub date: &'static [&'static str],
    pub description: &'static [&'static str],
    pub amount: &'static [&'static str],
    pub debit: &'static [&'static str],
    pub credit: &'static [&'static str],
}

pub const GENERIC: &str = "generic";

pub static BANK_PROFILES: &[BankProfile] = &[
    BankProfile {
        id: "chase",
        markers: &["chase"],
        date: &["Transaction Date", "Posting Date", "Date"],
        description: &["Description", "Merchant"],
        amount: &["Amount"],
        debit: &["Debit"],
        credit: &["Credit"],
    },
    BankProfile {
        id: "bank_of_america",
        markers: &["bank of america", "bofa"],
        date: &["Date", "Posted Date"],
        description: &["Description", "Payee"],
        amount: &["Amount"],
        debit: &[],
        credit: &[],
    },
    BankProfile {
        id: "wells_fargo",
        markers: &["wells fargo"],
        date: &["Date"],
        description: &["Description"],
        amount: &["Amount"],
        debit: &[],
        credit: &[],
    },
    BankProfile {
        id: GENERIC,
        markers: &[],
        date: &["Date", "Trans Date", "Transaction Date", "Posted", "Post Date", "Posting Date"],
        description: &["Description", "Memo", "Details", "Payee", "Name", "Merchant", "Narration"],
        amount: &["Amount", "Total", "Value", "Transaction Amount"],
        debit: &["Debit", "Withdrawal", "Withdrawals", "Outflow", "Debit Amount"],
        credit: &["Credit", "Deposit", "Deposits", "Inflow", "Credit Amount"],
    },
];

/// Pick the profile whose markers appear in the headers, else the generic one
pub fn profile_for_headers(headers: &[String]) -> &'static BankProfile {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    BANK_PROFILES
        .iter()
        .find(|p| {
            p.markers
                .iter()
                .any(|m| lowered.iter().any(|h| h.contains(m)))
        })
        .unwrap_or_else(generic_profile)
}

pub fn generic_profile() -> &'static BankProfile {
    &BANK_PROFILES[BANK_PROFILES.len() - 1]
}

/// Index of the first header equal (case-insensitive, trimmed) to a candidate
///
/// Candidates are tried in order, so earlier names win.
pub fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    candidates.iter().find_map(|name| {
        let name = name.to_lowercase();
        lowered.iter().position(|h| *h == name)
    })
}
