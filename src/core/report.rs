//! Report building: summary text and the CSV export.

use crate::core::invoices::InvoiceSummary;
use crate::entities::invoice;

/// Formats the aggregate summary for a chat message.
#[must_use]
pub fn summary_text(summary: &InvoiceSummary) -> String {
    format!(
        "📊 Invoice report\n\
         💰 Total invoiced: ${:.2}\n\
         ✅ Paid: ${:.2}\n\
         📨 Unpaid: ${:.2}\n\
         ⏰ Overdue: ${:.2}",
        summary.total, summary.paid, summary.unpaid, summary.overdue
    )
}

/// Builds the CSV export, one line per invoice row.
#[must_use]
pub fn build_csv(rows: &[invoice::Model]) -> String {
    let mut csv = String::from("ID,Customer Email,Amount,Currency,Description,Status,Created At\n");
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            row.id,
            escape_field(&row.customer_email),
            row.amount,
            escape_field(&row.currency),
            escape_field(&row.description),
            escape_field(&row.status),
            row.created_at.to_rfc3339(),
        ));
    }
    csv
}

/// Quotes a field when it contains a delimiter, quote or newline.
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
