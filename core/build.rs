// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

fn main() {
    // `sqlx::migrate!` embeds the migrations at compile time
    println!("cargo:rerun-if-changed=src/localdb/migrations");
}
