// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Valora — client-side persistence core for property-valuation/ESG reports.
//!
//! One synchronous key-value medium, one record format per report section, one
//! write path. Form components funnel through the write scheduler into the
//! section store; a one-shot migration reconciles historical key schemes into
//! a unified per-identity record; the readiness evaluator scores whatever is
//! currently stored.

pub mod migrate;
pub mod model;
pub mod notify;
pub mod readiness;
pub mod sched;
pub mod section;
pub mod store;

#[cfg(test)]
mod tests {
    #[test]
    fn sanity() {
        assert_eq!(2 + 2, 4);
    }
}
