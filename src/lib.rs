/*!
# pedido-scan

Verificação de separação de pedidos por código de barras, no navegador.

## Overview

The user uploads an Excel spreadsheet of order lines, optionally filters it
to a single order (`PEDIDO`), then scans product barcodes with a USB
reader. Matched rows are highlighted on screen (a strong color for each
scanned product, a soft background tone per filtered order) and the same
highlighting is baked into a downloadable `.xlsx`.

## Architecture

A single axum server owns one [`session::Session`] behind a mutex. Every
button on the page maps to a command handler that mutates the session and
returns user-visible notices; the page then refetches the full state
snapshot and redraws. All business logic lives below the HTTP layer and is
exercised directly by the unit tests.

## Modules

- **dataset**: the loaded table, cell typing and code/order column detection
- **colors**: the two 8-entry palettes and per-order color assignment
- **ledger**: append-only record of scanned codes
- **search**: the barcode matching cascade over the current view
- **highlight**: row → color, scan beating order, shared by screen and file
- **session**: per-session state and the command handlers
- **export**: regenerating the workbook with fills applied
- **app**: routing and request handling
*/

pub mod app;
pub mod colors;
pub mod dataset;
pub mod export;
pub mod highlight;
pub mod ledger;
pub mod search;
pub mod session;

pub use dataset::{CellValue, Dataset};
pub use session::{Notice, Session};
