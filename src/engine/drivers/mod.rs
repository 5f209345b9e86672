// SPDX-License-Identifier: Apache-2.0

// Reference connectors

pub mod sqlite;
