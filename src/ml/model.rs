use burn::{
    nn::{
        loss::BinaryCrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::data::batcher::ScamBatch;
use crate::domain::records::{TIME_SERIES_FEATURES, TOKENOMICS_FEATURES};
use crate::ml::text_encoder::{TextEncoder, TextEncoderConfig};

// #[derive(Config)] supplies Clone and the serde impls
#[derive(Config, Debug)]
pub struct HybridModelConfig {
    pub text_encoder:      TextEncoderConfig,
    #[config(default = 4)]
    pub rnn_input_size:    usize,
    #[config(default = 64)]
    pub rnn_hidden_size:   usize,
    #[config(default = 2)]
    pub rnn_layers:        usize,
    #[config(default = 2)]
    pub fnn_input_size:    usize,
    #[config(default = 64)]
    pub fnn_hidden_size:   usize,
    #[config(default = 32)]
    pub final_hidden_size: usize,
    #[config(default = 0.2)]
    pub dropout:           f64,
}

impl HybridModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> HybridModel<B> {
        debug_assert_eq!(self.rnn_input_size, TIME_SERIES_FEATURES);
        debug_assert_eq!(self.fnn_input_size, TOKENOMICS_FEATURES);

        // Layer i > 0 consumes the hidden sequence of layer i - 1
        let lstm = (0..self.rnn_layers.max(1))
            .map(|i| {
                let d_input = if i == 0 { self.rnn_input_size } else { self.rnn_hidden_size };
                LstmConfig::new(d_input, self.rnn_hidden_size, true).init(device)
            })
            .collect();

        let fused = self.rnn_hidden_size + 2 * self.fnn_hidden_size;

        HybridModel {
            lstm,
            fnn_in:          LinearConfig::new(self.fnn_input_size, self.fnn_hidden_size).init(device),
            fnn_out:         LinearConfig::new(self.fnn_hidden_size, self.fnn_hidden_size).init(device),
            text_encoder:    self.text_encoder.init(device).no_grad(),
            text_projection: LinearConfig::new(self.text_encoder.hidden_size, self.fnn_hidden_size).init(device),
            head_hidden:     LinearConfig::new(fused, self.final_hidden_size).init(device),
            head_out:        LinearConfig::new(self.final_hidden_size, 1).init(device),
            dropout:         DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// Three branches fused into one logit:
///
///   time_series [B,S,4]  → stacked LSTM → last hidden      [B,h_rnn]
///   features    [B,2]    → Linear-ReLU-Dropout-Linear-ReLU [B,h_fnn]
///   contract ids/mask    → frozen encoder <s> → Linear     [B,h_fnn]
///
///   concat → Linear-ReLU-Dropout-Linear → logit [B]
#[derive(Module, Debug)]
pub struct HybridModel<B: Backend> {
    pub lstm:            Vec<Lstm<B>>,
    pub fnn_in:          Linear<B>,
    pub fnn_out:         Linear<B>,
    pub text_encoder:    TextEncoder<B>,
    pub text_projection: Linear<B>,
    pub head_hidden:     Linear<B>,
    pub head_out:        Linear<B>,
    pub dropout:         Dropout,
}

impl<B: Backend> HybridModel<B> {
    /// Final hidden state of the top LSTM layer: [batch, rnn_hidden]
    fn encode_series(&self, time_series: Tensor<B, 3>) -> Tensor<B, 2> {
        let mut x = time_series;
        for layer in &self.lstm {
            let (output, _state) = layer.forward(x, None);
            x = output;
        }
        let [batch_size, seq_len, hidden] = x.dims();
        x.slice([0..batch_size, seq_len - 1..seq_len, 0..hidden])
            .reshape([batch_size, hidden])
    }

    fn encode_features(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.dropout.forward(relu(self.fnn_in.forward(features)));
        relu(self.fnn_out.forward(x))
    }

    fn encode_contract(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let cls = self.text_encoder.cls_embedding(input_ids, attention_mask);
        self.text_projection.forward(cls)
    }

    /// Raw logits, one per sample: [batch]
    pub fn forward(&self, batch: ScamBatch<B>) -> Tensor<B, 1> {
        let rnn_feature      = self.encode_series(batch.time_series);
        let csv_feature      = self.encode_features(batch.features);
        let contract_feature = self.encode_contract(batch.input_ids, batch.attention_mask);

        let combined = Tensor::cat(vec![rnn_feature, csv_feature, contract_feature], 1);
        let hidden   = self.dropout.forward(relu(self.head_hidden.forward(combined)));
        let logits   = self.head_out.forward(hidden);

        let [batch_size, _] = logits.dims();
        logits.reshape([batch_size])
    }

    /// Binary cross-entropy on logits against the batch labels.
    pub fn forward_loss(&self, batch: ScamBatch<B>) -> (Tensor<B, 1>, Tensor<B, 1>, Tensor<B, 1, Int>) {
        let labels = batch.labels.clone();
        let logits = self.forward(batch);
        let loss   = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device())
            .forward(logits.clone(), labels.clone());
        (loss, logits, labels)
    }
}

/// Squash logits to probabilities in [0, 1].
pub fn probabilities<B: Backend>(logits: Tensor<B, 1>) -> Tensor<B, 1> {
    sigmoid(logits)
}
