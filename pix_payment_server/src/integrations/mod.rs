pub mod mercado_pago;
