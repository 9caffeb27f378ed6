//! Native-order command - create a QR code payment

use anyhow::Result;
use wechatpay_lib::pay::{NativeOrderRequest, OrderAmount};

use super::MerchantArgs;
use crate::ui;

pub struct OrderArgs {
    pub description: String,
    pub out_trade_no: String,
    /// Amount in fen
    pub amount: i64,
    pub notify_url: String,
    pub attach: Option<String>,
}

pub async fn run(merchant: &MerchantArgs, order: OrderArgs) -> Result<()> {
    let client = merchant.client().await?;

    let mut request = NativeOrderRequest::new(
        order.description,
        order.out_trade_no.clone(),
        order.notify_url,
        OrderAmount::cny(order.amount),
    );
    if let Some(attach) = order.attach {
        request = request.with_attach(attach);
    }

    let spinner = ui::spinner("Creating order...");
    let code_url = client.native_order(request).await;
    spinner.finish_and_clear();
    let code_url = code_url?;

    ui::header("Native Order");
    ui::key_value("Order", &order.out_trade_no);
    ui::key_value("Code URL", &code_url);
    ui::qr_code(&code_url)?;
    ui::info("Scan the code with WeChat to pay");

    client.shutdown().await;
    Ok(())
}
