//! Command handlers: translate parsed arguments into service calls and print the outcome.

use anyhow::{anyhow, Context};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};

use clinic_core::{
    ClinicService, DiagnosticResult, FileUpload, Invoice, LineItem, NewDiagnosticResult,
    NewPatient, NewPayment, Patient, PatientUpdate, ResultUpdate,
};

use crate::{InvoiceCommand, PatientCommand, ResultCommand};

pub fn init(service: &ClinicService) -> anyhow::Result<()> {
    if !service.save_all() {
        return Err(anyhow!("failed to write one or more snapshots (see log)"));
    }
    println!(
        "Wrote snapshots to {}",
        service.config().data_dir().display()
    );
    Ok(())
}

pub fn patient(service: &ClinicService, command: PatientCommand) -> anyhow::Result<()> {
    match command {
        PatientCommand::Add {
            name,
            dob,
            contact,
            address,
            history,
            documents,
        } => {
            let documents = uploads(&documents)?;
            let patient = service.create_patient(NewPatient {
                name,
                dob,
                contact,
                address,
                history,
                documents,
            })?;
            println!("Created patient {}", patient.id);
            print_patient(&patient);
        }
        PatientCommand::List => print_patients(&service.patients()),
        PatientCommand::Search { term } => print_patients(&service.search_patients(&term)),
        PatientCommand::Show { id } => println!("{}", service.patient_profile_json(id)?),
        PatientCommand::Update { id, fields } => {
            let update = PatientUpdate {
                name: fields.name,
                dob: fields.dob,
                contact: fields.contact,
                address: fields.address,
                history: fields.history,
                documents: None,
            };
            let patient = service.update_patient(id, &update)?;
            println!("Updated patient {}", patient.id);
            print_patient(&patient);
        }
        PatientCommand::Delete { id } => {
            let summary = service.delete_patient(id);
            if summary.patient_removed {
                println!(
                    "Deleted patient {id} with {} result(s) and {} invoice(s)",
                    summary.results_removed, summary.invoices_removed
                );
            } else {
                println!("No patient {id}; nothing deleted");
            }
        }
        PatientCommand::Upload {
            id,
            path,
            media_type,
        } => {
            let upload = FileUpload::from_path(&path, media_type.as_deref())?;
            let document = service.upload_document(id, upload)?;
            println!(
                "Uploaded document {} ({}, {}) to patient {id}",
                document.id, document.name, document.media_type
            );
        }
        PatientCommand::Export { id, output } => {
            let json = service.patient_profile_json(id)?;
            let output = output.unwrap_or_else(|| PathBuf::from(format!("patient_{id}_profile.json")));
            write_output(&output, &json)?;
            println!("Exported patient {id} to {}", output.display());
        }
    }
    Ok(())
}

pub fn result(service: &ClinicService, command: ResultCommand) -> anyhow::Result<()> {
    match command {
        ResultCommand::Add {
            patient_id,
            test_name,
            value,
            date,
            status,
            attachments,
        } => {
            let date = date
                .map(|d| clinic_core::parse_date("date", &d))
                .transpose()?;
            let result = service.create_diagnostic_result(NewDiagnosticResult {
                value,
                date,
                status,
                attachments: uploads(&attachments)?,
                ..NewDiagnosticResult::new(patient_id, test_name)
            })?;
            println!("Recorded result {}", result.id);
            print_result(&result);
        }
        ResultCommand::List { patient } => {
            let results = match patient {
                Some(patient_id) => service.results_for_patient(patient_id),
                None => service.diagnostic_results(),
            };
            if results.is_empty() {
                println!("No results found.");
            }
            for result in &results {
                print_result(result);
            }
        }
        ResultCommand::Update {
            id,
            test_name,
            value,
            status,
            date,
        } => {
            let update = ResultUpdate {
                test_name,
                value,
                status,
                date,
            };
            let result = service.update_diagnostic_result(id, &update)?;
            println!("Updated result {}", result.id);
            print_result(&result);
        }
        ResultCommand::Delete { id } => {
            let removed = service.delete_diagnostic_result(id)?;
            println!("Deleted result {} ({})", removed.id, removed.test_name);
        }
        ResultCommand::Attach {
            id,
            path,
            media_type,
        } => {
            let upload = FileUpload::from_path(&path, media_type.as_deref())?;
            let attachment = service.attach_file_to_result(id, upload)?;
            println!(
                "Attached {} ({}) to result {id} as attachment {}",
                attachment.name, attachment.media_type, attachment.id
            );
        }
    }
    Ok(())
}

pub fn invoice(service: &ClinicService, command: InvoiceCommand) -> anyhow::Result<()> {
    match command {
        InvoiceCommand::Create {
            patient_id,
            amount,
            items,
        } => {
            let invoice = match amount {
                Some(amount) => service.create_invoice(patient_id, amount)?,
                None => {
                    let items = items
                        .iter()
                        .map(|raw| parse_line_item(raw))
                        .collect::<anyhow::Result<Vec<_>>>()?;
                    service.create_invoice_with_items(patient_id, items)?
                }
            };
            println!("Issued invoice {}", invoice.id);
            print_invoice(&invoice);
        }
        InvoiceCommand::Pay {
            id,
            amount,
            method,
            reference,
        } => {
            let payment = service.record_payment(
                id,
                NewPayment {
                    amount,
                    method,
                    reference,
                },
            )?;
            println!(
                "Recorded payment {} of {} ({})",
                payment.id, payment.amount, payment.method
            );
            print_invoice(&service.invoice(id)?);
        }
        InvoiceCommand::List { patient } => {
            let invoices = match patient {
                Some(patient_id) => service.invoices_for_patient(patient_id),
                None => service.invoices(),
            };
            if invoices.is_empty() {
                println!("No invoices found.");
            }
            for invoice in &invoices {
                print_invoice(invoice);
            }
        }
        InvoiceCommand::Show { id } => {
            let invoice = service.invoice(id)?;
            print_invoice(&invoice);
            for item in &invoice.items {
                println!("  item: {} {}", item.description, item.amount);
            }
            for payment in &invoice.payments {
                println!(
                    "  payment {}: {} via {} on {}{}",
                    payment.id,
                    payment.amount,
                    payment.method,
                    payment.recorded_at.format("%Y-%m-%d %H:%M"),
                    payment
                        .reference
                        .as_deref()
                        .map(|r| format!(" ref {r}"))
                        .unwrap_or_default()
                );
            }
        }
        InvoiceCommand::Csv { output } => {
            let csv = service.invoices_csv();
            match output {
                Some(path) => {
                    write_output(&path, &csv)?;
                    println!("Exported invoices to {}", path.display());
                }
                None => println!("{csv}"),
            }
        }
    }
    Ok(())
}

pub fn dashboard(service: &ClinicService) -> anyhow::Result<()> {
    let counters = service.dashboard_counters();
    println!("Patients:          {}", counters.patient_count);
    println!("Pending results:   {}", counters.pending_result_count);
    println!("Revenue collected: {}", counters.total_collected_revenue);

    println!("\nDaily billing:");
    for (date, amount) in service.daily_revenue_series() {
        println!("  {date}  {amount}");
    }

    println!("\nMonthly (billed / collected):");
    for (month, figures) in service.monthly_financial_series() {
        println!("  {month}  {} / {}", figures.billed, figures.collected);
    }
    Ok(())
}

pub fn report(service: &ClinicService) -> anyhow::Result<()> {
    let totals = service.report_totals();
    println!("Patients:    {}", totals.patient_count);
    println!("Billed:      {}", totals.total_billed);
    println!("Collected:   {}", totals.total_collected);
    println!("Outstanding: {}", totals.total_outstanding);

    let breakdown = service.status_breakdown();
    println!("\nBilled by status:");
    println!("  Paid     {}", breakdown.paid);
    println!("  Partial  {}", breakdown.partial);
    println!("  Unpaid   {}", breakdown.unpaid);
    Ok(())
}

/// Reads files given on the command line; media types are detected from the content.
fn uploads(paths: &[PathBuf]) -> anyhow::Result<Vec<FileUpload>> {
    paths
        .iter()
        .map(|path| {
            FileUpload::from_path(path, None)
                .with_context(|| format!("failed to read {}", path.display()))
        })
        .collect()
}

/// Parses `DESCRIPTION=AMOUNT`; the description may itself contain `=`.
fn parse_line_item(raw: &str) -> anyhow::Result<LineItem> {
    let (description, amount) = raw
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("line item '{raw}' must look like DESCRIPTION=AMOUNT"))?;
    let amount: Decimal = amount
        .trim()
        .parse()
        .with_context(|| format!("invalid amount in line item '{raw}'"))?;
    Ok(LineItem::new(description, amount)?)
}

fn write_output(path: &Path, contents: &str) -> anyhow::Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn print_patients(patients: &[Patient]) {
    if patients.is_empty() {
        println!("No patients found.");
    }
    for patient in patients {
        print_patient(patient);
    }
}

fn print_patient(patient: &Patient) {
    println!(
        "ID: {}, Name: {}, DOB: {}, Contact: {}, Address: {}, Documents: {}",
        patient.id,
        patient.name,
        patient.dob,
        patient.contact,
        patient.address,
        patient.documents.len()
    );
}

fn print_result(result: &DiagnosticResult) {
    println!(
        "Result {}: patient {}, {} on {}, {} [{}], attachments: {}",
        result.id,
        result.patient_id,
        result.test_name,
        result.date,
        if result.value.is_empty() { "-" } else { result.value.as_str() },
        result.status,
        result.attachments.len()
    );
}

fn print_invoice(invoice: &Invoice) {
    let settlement = invoice.settlement();
    println!(
        "Invoice {}: patient {}, issued {}, amount {}, paid {}, due {}, {}",
        invoice.id,
        invoice.patient_id,
        invoice.date,
        invoice.amount,
        settlement.paid_total,
        settlement.balance_due,
        settlement.status
    );
}
