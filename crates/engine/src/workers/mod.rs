// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The five long-lived scheduler workers (`spec.md` §4.4): Intake,
//! Admission, Finalizer, Cancel-Intake, and Cancel-Dispatch.

pub(crate) mod admission;
pub(crate) mod cancel_dispatch;
pub(crate) mod cancel_intake;
pub(crate) mod finalizer;
pub(crate) mod intake;
