// ============================================================
// Layer 5 — Pretrained Text Encoder (RoBERTa layout)
// ============================================================
// A BERT-style post-LN transformer encoder whose module tree
// mirrors the HuggingFace RoBERTa parameter names, so weights
// from a pretrained checkpoint (CodeBERT by default) can be
// imported by infra::pretrained with only a few key renames:
//
//   embeddings.{word,position,token_type}_embeddings
//   embeddings.layer_norm                    (HF: LayerNorm)
//   encoder.layer.N.attention.self_attn.*    (HF: attention.self)
//   encoder.layer.N.attention.output.{dense,layer_norm}
//   encoder.layer.N.intermediate.dense
//   encoder.layer.N.output.{dense,layer_norm}
//
// RoBERTa position ids start after the padding id:
//   real token i → pad_token_id + 1 + i,  padding → pad_token_id
//
// Reference: Liu et al. (2019) RoBERTa
//            Feng et al. (2020) CodeBERT
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{gelu, softmax},
};

/// Defaults are the codebert-base / roberta-base architecture.
#[derive(Config, Debug)]
pub struct TextEncoderConfig {
    #[config(default = 50265)]
    pub vocab_size:              usize,
    #[config(default = 768)]
    pub hidden_size:             usize,
    #[config(default = 12)]
    pub num_hidden_layers:       usize,
    #[config(default = 12)]
    pub num_attention_heads:     usize,
    #[config(default = 3072)]
    pub intermediate_size:       usize,
    #[config(default = 514)]
    pub max_position_embeddings: usize,
    #[config(default = 1)]
    pub type_vocab_size:         usize,
    #[config(default = 1e-5)]
    pub layer_norm_eps:          f64,
    #[config(default = 1)]
    pub pad_token_id:            usize,
    #[config(default = 0.1)]
    pub hidden_dropout_prob:     f64,
}

impl TextEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextEncoder<B> {
        let embeddings = Embeddings {
            word_embeddings:       EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device),
            position_embeddings:   EmbeddingConfig::new(self.max_position_embeddings, self.hidden_size).init(device),
            token_type_embeddings: EmbeddingConfig::new(self.type_vocab_size.max(1), self.hidden_size).init(device),
            layer_norm:            self.layer_norm(device),
            dropout:               self.dropout(),
            pad_token_id:          self.pad_token_id,
        };
        let layer = (0..self.num_hidden_layers)
            .map(|_| self.build_layer(device))
            .collect();
        TextEncoder { embeddings, encoder: EncoderStack { layer } }
    }

    /// Longest input (special tokens included) the position table can index.
    pub fn max_text_len(&self) -> usize {
        self.max_position_embeddings.saturating_sub(self.pad_token_id + 1)
    }

    fn build_layer<B: Backend>(&self, device: &B::Device) -> EncoderLayer<B> {
        let h = self.hidden_size;
        EncoderLayer {
            attention: Attention {
                self_attn: SelfAttention {
                    query:   LinearConfig::new(h, h).init(device),
                    key:     LinearConfig::new(h, h).init(device),
                    value:   LinearConfig::new(h, h).init(device),
                    dropout: self.dropout(),
                    n_heads: self.num_attention_heads,
                },
                output: ResidualOutput {
                    dense:      LinearConfig::new(h, h).init(device),
                    layer_norm: self.layer_norm(device),
                    dropout:    self.dropout(),
                },
            },
            intermediate: Intermediate {
                dense: LinearConfig::new(h, self.intermediate_size).init(device),
            },
            output: ResidualOutput {
                dense:      LinearConfig::new(self.intermediate_size, h).init(device),
                layer_norm: self.layer_norm(device),
                dropout:    self.dropout(),
            },
        }
    }

    fn layer_norm<B: Backend>(&self, device: &B::Device) -> LayerNorm<B> {
        LayerNormConfig::new(self.hidden_size)
            .with_epsilon(self.layer_norm_eps)
            .init(device)
    }

    fn dropout(&self) -> Dropout {
        DropoutConfig::new(self.hidden_dropout_prob).init()
    }
}

// ─── Embeddings ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Embeddings<B: Backend> {
    pub word_embeddings:       Embedding<B>,
    pub position_embeddings:   Embedding<B>,
    pub token_type_embeddings: Embedding<B>,
    pub layer_norm:            LayerNorm<B>,
    pub dropout:               Dropout,
    pub pad_token_id:          usize,
}

impl<B: Backend> Embeddings<B> {
    /// input_ids, attention_mask: [batch, seq_len] → [batch, seq_len, hidden]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        // Assumes right padding: the mask is a prefix of ones
        let positions = Tensor::<B, 1, Int>::arange(1..seq_len as i64 + 1, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len])
            .mul(attention_mask)
            .add_scalar(self.pad_token_id as i64);
        let token_types = Tensor::<B, 2, Int>::zeros([batch_size, seq_len], &device);

        let x = self.word_embeddings.forward(input_ids)
            + self.position_embeddings.forward(positions)
            + self.token_type_embeddings.forward(token_types);
        self.dropout.forward(self.layer_norm.forward(x))
    }
}

// ─── Self-attention ───────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct SelfAttention<B: Backend> {
    pub query:   Linear<B>,
    pub key:     Linear<B>,
    pub value:   Linear<B>,
    pub dropout: Dropout,
    pub n_heads: usize,
}

impl<B: Backend> SelfAttention<B> {
    /// x: [batch, seq, hidden], mask_bias: [batch, 1, 1, seq] (0 or -1e4)
    pub fn forward(&self, x: Tensor<B, 3>, mask_bias: Tensor<B, 4>) -> Tensor<B, 3> {
        let [batch_size, seq_len, hidden] = x.dims();
        let n_heads  = self.n_heads;
        let head_dim = hidden / n_heads;

        // [batch, seq, hidden] → [batch, heads, seq, head_dim]
        let split_heads = |t: Tensor<B, 3>| {
            t.reshape([batch_size, seq_len, n_heads, head_dim]).swap_dims(1, 2)
        };
        let q = split_heads(self.query.forward(x.clone()));
        let k = split_heads(self.key.forward(x.clone()));
        let v = split_heads(self.value.forward(x));

        let scores = q
            .matmul(k.swap_dims(2, 3))
            .div_scalar((head_dim as f64).sqrt())
            + mask_bias.expand([batch_size, n_heads, seq_len, seq_len]);
        let probs = self.dropout.forward(softmax(scores, 3));

        probs
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch_size, seq_len, hidden])
    }
}

/// dense → dropout → residual add → LayerNorm
#[derive(Module, Debug)]
pub struct ResidualOutput<B: Backend> {
    pub dense:      Linear<B>,
    pub layer_norm: LayerNorm<B>,
    pub dropout:    Dropout,
}

impl<B: Backend> ResidualOutput<B> {
    pub fn forward(&self, hidden: Tensor<B, 3>, residual: Tensor<B, 3>) -> Tensor<B, 3> {
        let hidden = self.dropout.forward(self.dense.forward(hidden));
        self.layer_norm.forward(hidden + residual)
    }
}

#[derive(Module, Debug)]
pub struct Attention<B: Backend> {
    pub self_attn: SelfAttention<B>,
    pub output:    ResidualOutput<B>,
}

#[derive(Module, Debug)]
pub struct Intermediate<B: Backend> {
    pub dense: Linear<B>,
}

#[derive(Module, Debug)]
pub struct EncoderLayer<B: Backend> {
    pub attention:    Attention<B>,
    pub intermediate: Intermediate<B>,
    pub output:       ResidualOutput<B>,
}

impl<B: Backend> EncoderLayer<B> {
    pub fn forward(&self, x: Tensor<B, 3>, mask_bias: Tensor<B, 4>) -> Tensor<B, 3> {
        let attn = self.attention.self_attn.forward(x.clone(), mask_bias);
        let x    = self.attention.output.forward(attn, x);
        let ff   = gelu(self.intermediate.dense.forward(x.clone()));
        self.output.forward(ff, x)
    }
}

#[derive(Module, Debug)]
pub struct EncoderStack<B: Backend> {
    pub layer: Vec<EncoderLayer<B>>,
}

// ─── TextEncoder ──────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct TextEncoder<B: Backend> {
    pub embeddings: Embeddings<B>,
    pub encoder:    EncoderStack<B>,
}

impl<B: Backend> TextEncoder<B> {
    /// input_ids, attention_mask: [batch, seq_len] → [batch, seq_len, hidden]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = attention_mask.dims();

        // 1 → 0.0 (attend), 0 → -1e4 (ignore); broadcast over heads and queries
        let mask_bias = attention_mask
            .clone()
            .float()
            .neg()
            .add_scalar(1.0)
            .mul_scalar(-1.0e4)
            .reshape([batch_size, 1, 1, seq_len]);

        let mut x = self.embeddings.forward(input_ids, attention_mask);
        for layer in &self.encoder.layer {
            x = layer.forward(x, mask_bias.clone());
        }
        x
    }

    /// Hidden state at the first position (<s>): [batch, hidden]
    pub fn cls_embedding(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let hidden = self.forward(input_ids, attention_mask);
        let [batch_size, _, d] = hidden.dims();
        hidden.slice([0..batch_size, 0..1, 0..d]).reshape([batch_size, d])
    }
}
